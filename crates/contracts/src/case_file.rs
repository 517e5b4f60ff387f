//! Static case briefing served to the terminal's case-file tabs.

use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION_V1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CaseTab {
    Summary,
    Report,
    Evidence,
    Charges,
}

impl CaseTab {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "summary" => Some(Self::Summary),
            "report" => Some(Self::Report),
            "evidence" => Some(Self::Evidence),
            "charges" => Some(Self::Charges),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseFile {
    pub schema_version: String,
    pub case_id: String,
    pub title: String,
    pub summary: String,
    pub report: String,
    pub evidence: String,
    pub charges: String,
}

impl CaseFile {
    pub fn tab(&self, tab: CaseTab) -> &str {
        match tab {
            CaseTab::Summary => &self.summary,
            CaseTab::Report => &self.report,
            CaseTab::Evidence => &self.evidence,
            CaseTab::Charges => &self.charges,
        }
    }
}

impl Default for CaseFile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            case_id: "01-104A".to_string(),
            title: "Billing Irregularities - North Sector Medical".to_string(),
            summary: "CASE ID: 01-104A\n\
                TITLE: Billing Irregularities - North Sector Medical\n\
                FLAG: POSSIBLE BILLING FRAUD\n\
                \n\
                Multiple patients reported charges for services they claim were never received.\n\
                Facility records appear internally consistent, but witness accounts conflict.\n\
                \n\
                OBJECTIVE:\n\
                Interview contacts. Identify inconsistencies. File charges."
                .to_string(),
            report: "INCIDENT REPORT (ABRIDGED)\n\
                - Patient complaints reference \"Observation Services\" and misc line items.\n\
                - Staff notes indicate standard intake procedures.\n\
                - Billing records show consistent coding; no manual overrides are documented.\n\
                - Several complaints occurred within the same 30-day window."
                .to_string(),
            evidence: "EVIDENCE NOTES\n\
                Attach notes when filing charges; they are forwarded to the prosecutor."
                .to_string(),
            charges: "CHARGE OPTIONS\n\
                - Fraudulent Billing\n\
                - False Reporting\n\
                - Administrative Negligence\n\
                \n\
                Tip: If you submit charges too early, prosecutor will reject or request more."
                .to_string(),
        }
    }
}
