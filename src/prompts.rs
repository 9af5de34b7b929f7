//! Fixed instructions sent to the model.

pub const REPORT_SCAN: &str = "Analyze the attached medical scan or report. Extract key findings, \
list abnormal values (if any), explain in plain language, and suggest reasonable next steps to \
discuss with a clinician. Do not provide a diagnosis; advise to consult a licensed medical \
professional.";

pub const SELF_TEST_TEXT: &str = "Hello from MedScan AI — test. Give a short greeting.";

pub const SELF_TEST_IMAGE: &str = "Test: Describe what you would do when given an image.";

pub fn symptom_analysis(symptoms: &str) -> String {
    format!(
        "You are a careful medical analysis assistant. \
         Given the patient's symptoms below, provide (in simple language):\n\
         1) Possible causes (brief list)\n\
         2) Severity level (low/medium/high) and why\n\
         3) Immediate first-aid recommendations\n\
         4) Whether the user should see a doctor urgently\n\n\
         Symptoms: {}\n\n\
         Return a clear, concise, human-friendly text answer.",
        symptoms
    )
}
