//! Canned queries for common ticket-analysis requests

/// Report period/shape for [`PromptTemplate::report`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportKind {
    #[default]
    Weekly,
    Monthly,
    Summary,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Weekly => "weekly",
            ReportKind::Monthly => "monthly",
            ReportKind::Summary => "summary",
        }
    }
}

impl std::str::FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weekly" => Ok(ReportKind::Weekly),
            "monthly" => Ok(ReportKind::Monthly),
            "summary" => Ok(ReportKind::Summary),
            other => Err(format!("Unknown report kind: {}", other)),
        }
    }
}

/// Query templates that steer the model toward the tool backend
pub struct PromptTemplate;

impl PromptTemplate {
    /// Wrap a free-form question so the model reaches for the tools
    pub fn analyze_tickets(query: &str) -> String {
        format!(
            "{}. Please use the available ticketing tools to get relevant data and provide insights.",
            query.trim_end_matches('.')
        )
    }

    /// Ask for a periodic report built from current data
    pub fn report(kind: ReportKind) -> String {
        format!(
            "Generate a comprehensive {} ticket report. Include ticket statistics, trends, and actionable insights. Use the database tools to get current data.",
            kind.as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_tickets_appends_instruction() {
        let prompt = PromptTemplate::analyze_tickets("Which groups are busiest.");
        assert!(prompt.starts_with("Which groups are busiest. Please use"));
    }

    #[test]
    fn test_report_mentions_kind() {
        assert!(PromptTemplate::report(ReportKind::Monthly).contains("monthly ticket report"));
        assert_eq!(ReportKind::default(), ReportKind::Weekly);
    }

    #[test]
    fn test_report_kind_parse() {
        assert_eq!("Summary".parse::<ReportKind>().unwrap(), ReportKind::Summary);
        assert!("daily".parse::<ReportKind>().is_err());
    }
}
