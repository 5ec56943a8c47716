//! Column names of the sales tracker sheet.

pub const AC_NAME_COL: &str = "AC Name";
pub const DATE_COL: &str = "Date";

/// Numeric metric columns summed per AC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    CashIn,
    Enrl,
    SgrConversion,
    FreshLeads,
    SgrLeads,
    OverallLeads,
}

impl Metric {
    /// All metrics in sheet order.
    pub const ALL: [Metric; 6] = [
        Metric::CashIn,
        Metric::Enrl,
        Metric::SgrConversion,
        Metric::FreshLeads,
        Metric::SgrLeads,
        Metric::OverallLeads,
    ];

    /// Series drawn on the performance chart.
    pub const CHARTED: [Metric; 3] = [Metric::CashIn, Metric::Enrl, Metric::SgrConversion];

    pub fn column_name(self) -> &'static str {
        match self {
            Metric::CashIn => "Cash-in",
            Metric::Enrl => "Enrl",
            Metric::SgrConversion => "SGR Conversion",
            Metric::FreshLeads => "Fresh Leads",
            Metric::SgrLeads => "SGR Leads",
            Metric::OverallLeads => "Overall Leads",
        }
    }

    /// Position in [`Metric::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Every column the loader requires.
pub fn required_columns() -> Vec<&'static str> {
    let mut cols = vec![AC_NAME_COL, DATE_COL];
    cols.extend(Metric::ALL.iter().map(|m| m.column_name()));
    cols
}
