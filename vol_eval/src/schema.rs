/// schema.rs — Canonical column schema for input CSVs
///
/// The upstream producers disagree on column names (a GARCH file may carry
/// `volatility_garch` or plain `volatility`, an LSTM file `volatility_lstm`
/// or `volatility`).  Each canonical column lists the source names it
/// accepts, in priority order; the first one present in a file wins.
use polars::prelude::DataFrame;

pub const DATE_COLUMN: &str = "date";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

impl ColumnSpec {
    /// First accepted source column present in `df`.
    pub fn resolve(&self, df: &DataFrame) -> Option<&'static str> {
        self.aliases.iter().copied().find(|name| df.column(name).is_ok())
    }
}

pub const REALIZED: ColumnSpec = ColumnSpec { canonical: "rv20", aliases: &["rv20"] };

pub const GARCH: ColumnSpec = ColumnSpec {
    canonical: "volatility_garch",
    aliases: &["volatility_garch", "volatility"],
};

pub const LSTM: ColumnSpec = ColumnSpec {
    canonical: "volatility_lstm",
    aliases: &["volatility_lstm", "volatility"],
};

pub const EGARCH: ColumnSpec = ColumnSpec {
    canonical: "volatility_egarch",
    aliases: &["volatility_egarch"],
};

pub const LOG_RETURN: ColumnSpec = ColumnSpec { canonical: "log_return", aliases: &["log_return"] };
