//! Table command implementation

use crate::cli::TableArgs;
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::{CoefficientRow, ServiceRow, TableEntryOutput, TableOutput};
use anyhow::Result;
use ecogep_core::models::coefficients::CategoryEntry;
use ecogep_core::CoefficientTable;

pub fn execute(args: TableArgs, output: &OutputWriter) -> Result<()> {
    let table = CoefficientTable::new();

    let entries: Vec<&CategoryEntry> = match args.category.as_deref() {
        None => table.iter().collect(),
        Some(name) => {
            let exact: Vec<_> = table.iter().filter(|e| e.category == name).collect();
            let selected =
                if exact.is_empty() { table.by_land_class(name).collect() } else { exact };
            if selected.is_empty() {
                let known: Vec<&str> = table.categories().collect();
                return Err(errors::category_not_found(name, &known).into());
            }
            selected
        }
    };

    if output.is_json() {
        let rows = entries.iter().map(|entry| TableEntryOutput::from(*entry)).collect();
        return output.result(TableOutput { rows });
    }

    if let [entry] = entries.as_slice() {
        output.section(entry.category);
        output.table(ServiceRow::for_entry(entry));
        output.kv("合计", format!("{:.2}", entry.coefficients.total()));
    } else {
        output.section("单位面积生态系统服务价值当量");
        output.table(entries.iter().map(|entry| CoefficientRow::from(*entry)).collect());
    }
    output.info("当量因子以 1 公顷全国平均农田的年粮食产值为 1");

    Ok(())
}
