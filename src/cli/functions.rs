//! Logical function listing.

use crate::cli::common::{print_json, CliResult};
use crate::models::{LogicalFunction, PortCategory};
use clap::Args;
use serde::Serialize;

/// List the logical printer functions ports can be assigned to
#[derive(Debug, Clone, Args)]
pub struct FunctionsArgs {
    /// Only functions using this port category
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<PortCategory>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// One function as shown by the CLI and the web API.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionInfo {
    /// Function key
    pub key: &'static str,
    /// Port category it needs
    pub category: PortCategory,
    /// Whether a secondary port can be added
    pub multi_pin: bool,
    /// Whether the input gets a pull-up by default
    pub pullup: bool,
    /// Short description
    pub description: &'static str,
}

impl From<LogicalFunction> for FunctionInfo {
    fn from(function: LogicalFunction) -> Self {
        Self {
            key: function.key(),
            category: function.category(),
            multi_pin: function.supports_secondary(),
            pullup: function.needs_pullup(),
            description: function.description(),
        }
    }
}

/// All functions, optionally filtered by category, in rendering order.
#[must_use]
pub fn function_infos(category: Option<PortCategory>) -> Vec<FunctionInfo> {
    LogicalFunction::ALL
        .into_iter()
        .filter(|f| category.is_none_or(|c| f.category() == c))
        .map(FunctionInfo::from)
        .collect()
}

impl FunctionsArgs {
    /// Execute the functions command
    pub fn execute(&self) -> CliResult<()> {
        let functions = function_infos(self.category);

        if self.json {
            return print_json(&functions);
        }

        for info in &functions {
            let mut flags = Vec::new();
            if info.multi_pin {
                flags.push("multi-pin");
            }
            if info.pullup {
                flags.push("pull-up");
            }
            println!(
                "  {:<22} {:<11} {:<30} {}",
                info.key,
                info.category.as_str(),
                info.description,
                flags.join(", ")
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_by_category() {
        let fans = function_infos(Some(PortCategory::Fan));
        assert_eq!(fans.len(), 7);
        assert!(fans.iter().all(|f| f.multi_pin));

        let all = function_infos(None);
        assert_eq!(all.len(), LogicalFunction::ALL.len());
        assert_eq!(all[0].key, "stepper_x");
    }
}
