//! Form catalog.
//!
//! Every request kind the portal accepts is described once here: what the
//! renderer shows (fields and file slots), which label identifies it on the
//! wire, and how its submission maps onto its detail table. The intake
//! pipeline and the table bootstrap both read these definitions, so adding a
//! column means adding one `ColumnMapping` line.

use serde::Serialize;

use crate::campus::CampusDirectory;

/// The nine request kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormKind {
    DuplicateGradeCard,
    CgpaConversion,
    SupplementaryExam,
    DuplicateDegree,
    NameChange,
    RepeatPaper,
    Retotaling,
    OnRequestDegree,
    MigrationCertificate,
}

impl FormKind {
    pub const ALL: [FormKind; 9] = [
        FormKind::DuplicateGradeCard,
        FormKind::CgpaConversion,
        FormKind::SupplementaryExam,
        FormKind::DuplicateDegree,
        FormKind::NameChange,
        FormKind::RepeatPaper,
        FormKind::Retotaling,
        FormKind::OnRequestDegree,
        FormKind::MigrationCertificate,
    ];

    pub fn definition(self) -> &'static FormDefinition {
        match self {
            FormKind::DuplicateGradeCard => &DUPLICATE_GRADE_CARD,
            FormKind::CgpaConversion => &CGPA_CONVERSION,
            FormKind::SupplementaryExam => &SUPPLEMENTARY_EXAM,
            FormKind::DuplicateDegree => &DUPLICATE_DEGREE,
            FormKind::NameChange => &NAME_CHANGE,
            FormKind::RepeatPaper => &REPEAT_PAPER,
            FormKind::Retotaling => &RETOTALING,
            FormKind::OnRequestDegree => &ON_REQUEST_DEGREE,
            FormKind::MigrationCertificate => &MIGRATION_CERTIFICATE,
        }
    }

    /// Canonical label, stored in `applications.form_type`.
    pub fn label(self) -> &'static str {
        self.definition().label
    }

    /// Match a submitted `formType`/`formId` against label, title or id.
    pub fn resolve(value: &str) -> Option<FormKind> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|kind| {
            let def = kind.definition();
            def.label == value || def.title == value || def.id == value
        })
    }

    pub fn by_id(id: &str) -> Option<FormKind> {
        Self::ALL.into_iter().find(|kind| kind.definition().id == id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Email,
    Textarea,
    Select,
    Number,
    DateRange,
}

/// One input the renderer collects.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub options: &'static [&'static str],
    pub placeholder: Option<&'static str>,
}

impl FieldSpec {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
            options: &[],
            placeholder: None,
        }
    }

    const fn select(name: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        let mut field = Self::new(name, label, FieldKind::Select);
        field.options = options;
        field
    }

    const fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

/// A named file part and the detail column its provider id lands in.
#[derive(Debug, Serialize)]
pub struct FileSlot {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    #[serde(skip)]
    pub column: &'static str,
}

impl FileSlot {
    const fn new(name: &'static str, label: &'static str, column: &'static str) -> Self {
        Self {
            name,
            label,
            required: true,
            column,
        }
    }

    const fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Stored as-is, `""` when absent.
    Text,
    /// Parsed as a float, `0.0` when absent or unparsable.
    Real,
}

/// Submission key → detail column.
#[derive(Debug)]
pub struct ColumnMapping {
    pub source: &'static str,
    pub column: &'static str,
    pub kind: ColumnKind,
}

const fn text(source: &'static str, column: &'static str) -> ColumnMapping {
    ColumnMapping {
        source,
        column,
        kind: ColumnKind::Text,
    }
}

const fn real(source: &'static str, column: &'static str) -> ColumnMapping {
    ColumnMapping {
        source,
        column,
        kind: ColumnKind::Real,
    }
}

#[derive(Debug)]
pub struct FormDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub label: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    pub files: &'static [FileSlot],
    pub columns: &'static [ColumnMapping],
}

impl FormDefinition {
    pub fn file_slot(&self, name: &str) -> Option<&'static FileSlot> {
        self.files.iter().find(|slot| slot.name == name)
    }

    /// Renderer-facing view. Campus options follow the injected directory.
    pub fn view<'a>(&'static self, campuses: &'a CampusDirectory) -> FormView<'a> {
        let fields = self
            .fields
            .iter()
            .map(|field| FieldView {
                name: field.name,
                label: field.label,
                kind: field.kind,
                required: field.required,
                options: if field.name == CAMPUS.name {
                    campuses.campuses().collect()
                } else {
                    field.options.to_vec()
                },
                placeholder: field.placeholder,
            })
            .collect();

        FormView {
            id: self.id,
            title: self.title,
            form_type: self.label,
            fields,
            files: self.files,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView<'a> {
    pub id: &'static str,
    pub title: &'static str,
    pub form_type: &'static str,
    pub fields: Vec<FieldView<'a>>,
    pub files: &'static [FileSlot],
}

#[derive(Debug, Serialize)]
pub struct FieldView<'a> {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

// =============================================================================
// Shared fields
// =============================================================================

pub const DEFAULT_CAMPUSES: [&str; 4] = [
    "Prashanti Nilayam Campus",
    "Anantapur Campus",
    "Brindavan Campus",
    "Nandigiri Campus",
];

const SEMESTERS: &[&str] = &["I", "II", "III", "IV", "V", "VI", "VII", "VIII"];

const EMAIL: FieldSpec = FieldSpec::new("email", "Email Address", FieldKind::Email);
const APPLICANT_NAME: FieldSpec = FieldSpec::new("applicantName", "Applicant Name", FieldKind::Text);
const REG_NO: FieldSpec = FieldSpec::new("regNo", "Registration Number", FieldKind::Text);
const CAMPUS: FieldSpec = FieldSpec::select("campus", "Campus", &DEFAULT_CAMPUSES);
const PROGRAM: FieldSpec = FieldSpec::new("program", "Academic Programme", FieldKind::Text);
const MOBILE: FieldSpec = FieldSpec::new("mobile", "Mobile Number", FieldKind::Text);
const ADDRESS: FieldSpec = FieldSpec::new("correspondenceAddress", "Correspondence Address", FieldKind::Textarea);
const PERIOD_OF_STUDY: FieldSpec = FieldSpec::new("periodOfStudy", "Period of Study", FieldKind::DateRange)
    .placeholder("e.g., June 2019 - March 2022");
const SEMESTER: FieldSpec = FieldSpec::select("semester", "Semester", SEMESTERS);
const PAPER_CODES: FieldSpec = FieldSpec::new("paperCodes", "Paper Code(s)", FieldKind::Text);
const PAPER_TITLES: FieldSpec = FieldSpec::new("paperTitles", "Paper Title(s)", FieldKind::Text);

const SBI_RECEIPT: FileSlot = FileSlot::new("sbiReceipt", "SBI Collect Receipt", "sbi_receipt_file_id");
const GRADE_CARD: FileSlot = FileSlot::new("gradeCard", "Grade Card Copy", "grade_card_file_id");
const AFFIDAVIT: FileSlot = FileSlot::new("affidavit", "Sworn Affidavit", "affidavit_file_id");

// =============================================================================
// Definitions
// =============================================================================

static DUPLICATE_GRADE_CARD: FormDefinition = FormDefinition {
    id: "duplicate-grade-card",
    title: "Duplicate Grade Card",
    label: "Duplicate Grade Card",
    table: "form_duplicate_grade_card",
    fields: &[
        EMAIL,
        APPLICANT_NAME,
        REG_NO,
        CAMPUS,
        PROGRAM,
        MOBILE,
        ADDRESS,
        PERIOD_OF_STUDY,
        SEMESTER,
        FieldSpec::new("reason", "Reason for Loss", FieldKind::Textarea),
    ],
    files: &[
        FileSlot::new("policeComplaint", "Police Complaint (if lodged)", "police_complaint_file_id").optional(),
        AFFIDAVIT,
        FileSlot::new("gradeCard", "Original Grade Card (Scanned)", "grade_card_file_id"),
        FileSlot::new("sbiReceipt", "SBI Collect Receipt (Rs. 500)", "sbi_receipt_file_id"),
    ],
    columns: &[
        text("email", "student_email"),
        text("applicantName", "student_name"),
        text("correspondenceAddress", "student_address"),
        text("mobile", "mobile_number"),
        text("regNo", "registration_number"),
        text("campus", "campus"),
        text("program", "programme"),
        text("periodOfStudy", "period_of_study"),
        text("semester", "semester"),
        text("reason", "reason"),
    ],
};

static CGPA_CONVERSION: FormDefinition = FormDefinition {
    id: "cgpa-conversion",
    title: "CGPA to Marks Conversion",
    label: "CGPA to Marks Conversion",
    table: "form_cgpa_conversion",
    fields: &[
        EMAIL,
        APPLICANT_NAME,
        REG_NO,
        CAMPUS,
        PROGRAM,
        MOBILE,
        ADDRESS,
        PERIOD_OF_STUDY,
        FieldSpec::new("monthOfPassing", "Month & Year of Passing", FieldKind::Text),
        FieldSpec::new("cgpa", "CGPA", FieldKind::Number),
    ],
    files: &[GRADE_CARD, SBI_RECEIPT],
    columns: &[
        text("applicantName", "student_name"),
        text("correspondenceAddress", "student_address"),
        text("mobile", "mobile_number"),
        text("regNo", "registration_number"),
        text("program", "programme"),
        text("periodOfStudy", "period_of_study"),
        text("monthOfPassing", "graduation_year"),
        real("cgpa", "cgpa"),
    ],
};

static SUPPLEMENTARY_EXAM: FormDefinition = FormDefinition {
    id: "supplementary-exam",
    title: "Supplementary Examination",
    label: "Supplementary Examination",
    table: "form_supplementary_exam",
    fields: &[
        EMAIL,
        APPLICANT_NAME,
        REG_NO,
        CAMPUS,
        PROGRAM,
        MOBILE,
        ADDRESS,
        PERIOD_OF_STUDY,
        SEMESTER,
        PAPER_CODES,
        PAPER_TITLES,
    ],
    files: &[SBI_RECEIPT],
    columns: &[
        text("email", "student_email"),
        text("periodOfStudy", "period_of_study"),
        text("applicantName", "student_name"),
        text("regNo", "registration_number"),
        text("campus", "campus"),
        text("program", "programme"),
        text("mobile", "mobile_number"),
        text("correspondenceAddress", "student_address"),
        text("paperCodes", "paper_codes"),
        text("paperTitles", "paper_titles"),
        text("semester", "semester"),
    ],
};

static DUPLICATE_DEGREE: FormDefinition = FormDefinition {
    id: "duplicate-degree",
    title: "Duplicate Degree Certificate",
    label: "Duplicate Degree Certificate",
    table: "form_duplicate_degree",
    fields: &[
        EMAIL,
        APPLICANT_NAME,
        REG_NO,
        CAMPUS,
        PROGRAM,
        ADDRESS,
        PERIOD_OF_STUDY,
        FieldSpec::new("yearOforiginalDegree", "Year of Original Degree", FieldKind::Text),
        FieldSpec::new("reason", "Reason for Request", FieldKind::Textarea),
    ],
    files: &[
        FileSlot::new("policeComplaint", "Police Complaint", "police_complaint_file_id"),
        FileSlot::new("pressNotification", "Press Notification/Advertisement", "press_notification_file_id"),
        AFFIDAVIT,
    ],
    columns: &[
        text("applicantName", "student_name"),
        text("email", "student_email"),
        text("correspondenceAddress", "student_address"),
        text("regNo", "reg_no"),
        text("campus", "campus"),
        text("program", "programme"),
        text("periodOfStudy", "period_of_study"),
        text("yearOforiginalDegree", "year_of_passing"),
        text("reason", "reason"),
    ],
};

static NAME_CHANGE: FormDefinition = FormDefinition {
    id: "name-change",
    title: "Name Change Registration",
    label: "Application for Registration of Student Name change in the Institute Records",
    table: "form_name_change",
    fields: &[
        EMAIL,
        APPLICANT_NAME,
        REG_NO,
        CAMPUS,
        PROGRAM,
        FieldSpec::new("fatherName", "Father's Name", FieldKind::Text),
        MOBILE,
        PERIOD_OF_STUDY,
        ADDRESS,
        FieldSpec::new("newName", "New Name (as per Gazette)", FieldKind::Text),
    ],
    files: &[
        FileSlot::new("gazetteNotification", "Gazette Notification", "gazette_notification_file_id"),
        SBI_RECEIPT,
    ],
    columns: &[
        text("applicantName", "existing_name"),
        text("fatherName", "father_name"),
        text("regNo", "reg_no"),
        text("campus", "campus"),
        text("mobile", "mobile_number"),
        text("periodOfStudy", "period_of_study"),
        text("correspondenceAddress", "student_address"),
        text("newName", "changed_name"),
    ],
};

static REPEAT_PAPER: FormDefinition = FormDefinition {
    id: "repeat-paper",
    title: "Repeat Paper (CIE + ESE)",
    label: "Application for repeating a paper for supplementary examinations(CIE and ESE)",
    table: "form_repeat_paper",
    fields: &[
        EMAIL,
        APPLICANT_NAME,
        REG_NO,
        CAMPUS,
        PROGRAM,
        MOBILE,
        ADDRESS,
        PERIOD_OF_STUDY,
        SEMESTER,
        PAPER_CODES,
        PAPER_TITLES,
    ],
    files: &[SBI_RECEIPT],
    columns: &[
        text("periodOfStudy", "period_of_study"),
        text("applicantName", "student_name"),
        text("regNo", "reg_no"),
        text("campus", "campus"),
        text("program", "programme"),
        text("mobile", "mobile_number"),
        text("correspondenceAddress", "student_address"),
        text("paperCodes", "paper_codes"),
        text("paperTitles", "paper_titles"),
        text("semester", "semester"),
    ],
};

static RETOTALING: FormDefinition = FormDefinition {
    id: "retotaling",
    title: "Re-totaling of Marks",
    label: "Application for Re-Totalling of Marks",
    table: "form_retotaling",
    fields: &[
        EMAIL,
        APPLICANT_NAME,
        REG_NO,
        CAMPUS,
        PROGRAM,
        FieldSpec::select(
            "examType",
            "Examination",
            &["End Semester Examination", "Supplementary Examination"],
        ),
        FieldSpec::new("subjectCode", "Paper Code(s) & Title(s)", FieldKind::Textarea),
        MOBILE,
        ADDRESS,
    ],
    files: &[
        FileSlot::new("gradeCard", "Grade Card", "grade_card_file_id"),
        SBI_RECEIPT,
    ],
    columns: &[
        text("examType", "exam_type"),
        text("applicantName", "student_name"),
        text("regNo", "reg_no"),
        text("campus", "campus"),
        text("program", "programme"),
        text("subjectCode", "paper_codes_titles_for_retotaling"),
        text("mobile", "mobile_number"),
        text("correspondenceAddress", "student_address"),
        text("email", "student_email"),
    ],
};

static ON_REQUEST_DEGREE: FormDefinition = FormDefinition {
    id: "on-request-degree",
    title: "On-Request Degree Certificate",
    label: "On-Request Degree Certificate",
    table: "form_on_request_degree",
    fields: &[
        EMAIL,
        APPLICANT_NAME,
        REG_NO,
        CAMPUS,
        PROGRAM,
        ADDRESS,
        MOBILE,
        FieldSpec::new("degreeAppliedFor", "Degree Applied For", FieldKind::Text),
    ],
    files: &[
        FileSlot::new("qualifyingCert", "Qualifying Certificate", "qualifying_cert_file_id"),
        SBI_RECEIPT,
    ],
    columns: &[
        text("applicantName", "student_name"),
        text("regNo", "reg_no"),
        text("campus", "campus"),
        text("correspondenceAddress", "student_address"),
        text("mobile", "mobile_number"),
        text("degreeAppliedFor", "degree_applied_for"),
    ],
};

static MIGRATION_CERTIFICATE: FormDefinition = FormDefinition {
    id: "migration",
    title: "Migration Certificate",
    label: "Application for Migration Certificate",
    table: "form_migration_certificate",
    fields: &[
        EMAIL,
        APPLICANT_NAME,
        REG_NO,
        CAMPUS,
        MOBILE,
        // Key spellings match what deployed clients already send
        FieldSpec::new("yearofAdmission", "Year of Admission", FieldKind::Text),
        FieldSpec::new("lastExam", "Last Examination Passed", FieldKind::Text),
        FieldSpec::new("degreeRecieved", "Degree Received", FieldKind::Text),
        FieldSpec::new("universityInstitute", "Name of the University joining", FieldKind::Text),
        FieldSpec::new("migrationAddress", "Address for Correspondence", FieldKind::Textarea),
    ],
    files: &[FileSlot::new("gradeCard", "Consolidated Grade Card", "grade_card_file_id")],
    columns: &[
        text("applicantName", "student_name"),
        text("mobile", "mobile_number"),
        text("yearofAdmission", "admission_year"),
        text("campus", "campus_of_admission"),
        text("lastExam", "last_examination_passed"),
        text("degreeRecieved", "degree_received"),
        text("universityInstitute", "university_to_migrate"),
        text("migrationAddress", "correspondence_address"),
    ],
};
