use tracing::warn;

use crate::breakpoint::Breakpoint;
use crate::structure::{HeaderDescriptor, StructureVariant, TableConfig, TableStructure};

/// Channel for non-fatal developer diagnostics emitted during structure
/// resolution. Injected at construction so tests can capture messages and
/// quiet builds can drop them.
pub trait WarnSink {
    fn warn(&self, message: &str);
}

/// Forwards diagnostics to the tracing subscriber.
pub struct TracingWarnSink;

impl WarnSink for TracingWarnSink {
    fn warn(&self, message: &str) {
        warn!("{message}");
    }
}

/// Drops all diagnostics.
pub struct NullWarnSink;

impl WarnSink for NullWarnSink {
    fn warn(&self, _message: &str) {}
}

/// Resolves the header structure for a table type against the current
/// breakpoint.
///
/// Resolution is driven by the `TableConfig`: each table type can declare
/// breakpoint specific header variants, so the table experience can differ
/// per screen size. Without a configuration entry the structure is derived
/// from the field names of a sample record, and without sample data a
/// placeholder with hidden headers is generated.
pub struct StructureResolver {
    config: TableConfig,
    sink: Box<dyn WarnSink>,
}

impl StructureResolver {
    pub fn new(config: TableConfig, sink: Box<dyn WarnSink>) -> Self {
        StructureResolver { config, sink }
    }

    pub fn has_config(&self, table_type: &str) -> bool {
        self.config.contains(table_type)
    }

    /// Builds the table structure for `table_type`.
    ///
    /// `sample_fields` are the field names of the first available data
    /// record, in the record's natural order. An empty sample is treated
    /// the same as no sample.
    pub fn resolve<S: AsRef<str>>(
        &self,
        table_type: &str,
        sample_fields: Option<&[S]>,
        current: Breakpoint,
    ) -> TableStructure {
        if let Some(variants) = self.config.get(table_type) {
            self.from_config(table_type, variants, current)
        } else {
            match sample_fields {
                Some(fields) if !fields.is_empty() => self.from_sample(table_type, fields),
                _ => self.placeholder(table_type),
            }
        }
    }

    /// Finds the best applicable variant for the current breakpoint, using
    /// a mobile first approach: the nearest variant at or below `current`
    /// wins. Without any breakpoint match the fallback is the variant
    /// without a breakpoint, and last the first declared variant.
    fn from_config(
        &self,
        table_type: &str,
        variants: &[StructureVariant],
        current: Breakpoint,
    ) -> TableStructure {
        let relevant = Breakpoint::ALL.iter().filter(|bp| **bp <= current).rev();

        let best_match = relevant
            .filter_map(|bp| variants.iter().find(|v| v.breakpoint == Some(*bp)))
            .next();

        let variant = best_match
            .or_else(|| variants.iter().find(|v| v.breakpoint.is_none()))
            .or_else(|| variants.first());

        match variant {
            Some(v) => TableStructure {
                table_type: table_type.to_string(),
                headers: v.headers.clone(),
                hide_header: false,
            },
            // Unreachable for the non-empty entries TableConfig::get returns
            None => self.placeholder(table_type),
        }
    }

    fn from_sample<S: AsRef<str>>(&self, table_type: &str, fields: &[S]) -> TableStructure {
        self.sink.warn(&format!(
            "No table configuration found to render table with type \"{table_type}\". \
             The table header for \"{table_type}\" is generated by the help of the first data item"
        ));

        let headers = fields
            .iter()
            .map(|f| HeaderDescriptor::labeled(f.as_ref(), f.as_ref()))
            .collect();

        TableStructure {
            table_type: table_type.to_string(),
            headers,
            hide_header: false,
        }
    }

    fn placeholder(&self, table_type: &str) -> TableStructure {
        self.sink.warn(&format!(
            "No data available for \"{table_type}\", a placeholder structure is generated \
             (with hidden table headers)."
        ));

        TableStructure {
            table_type: table_type.to_string(),
            headers: vec![HeaderDescriptor::new("unknown"); 5],
            hide_header: true,
        }
    }
}
