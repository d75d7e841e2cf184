//! 透视表构建

use std::collections::{BTreeMap, BTreeSet};

use super::statistics::reduce_numbers;
use super::types::PivotTable;
use crate::core::{AggregationOperation, Record, Value};

/// 二维交叉汇总
///
/// 行、列按维度值的自然顺序排序；矩阵是稠密的，
/// 没有匹配行的单元格取 0
#[derive(Debug, Clone)]
pub struct PivotBuilder<'a> {
    row_field: &'a str,
    column_field: &'a str,
    value_field: &'a str,
    operation: AggregationOperation,
}

impl<'a> PivotBuilder<'a> {
    pub fn new(
        row_field: &'a str,
        column_field: &'a str,
        value_field: &'a str,
        operation: AggregationOperation,
    ) -> Self {
        Self {
            row_field,
            column_field,
            value_field,
            operation,
        }
    }

    pub fn build(&self, records: &[Record]) -> PivotTable {
        let mut cells: BTreeMap<&Value, BTreeMap<&Value, Vec<f64>>> = BTreeMap::new();
        let mut columns: BTreeSet<&Value> = BTreeSet::new();

        for record in records {
            let row = record.get(self.row_field);
            let column = record.get(self.column_field);
            columns.insert(column);
            let bucket = cells.entry(row).or_default().entry(column).or_default();
            // count 统计行数，其余操作只取数值
            match record.get(self.value_field).as_f64() {
                Some(value) => bucket.push(value),
                None if self.operation == AggregationOperation::Count => bucket.push(0.0),
                None => {}
            }
        }

        let column_keys: Vec<String> = columns.iter().map(|c| c.to_key_string()).collect();
        let mut table = PivotTable {
            rows: Vec::with_capacity(cells.len()),
            columns: column_keys,
            data: BTreeMap::new(),
        };

        for (row, row_cells) in cells {
            let row_key = row.to_key_string();
            let data: BTreeMap<String, f64> = columns
                .iter()
                .map(|column| {
                    let value = row_cells
                        .get(column)
                        .map(|values| reduce_numbers(self.operation, values))
                        .unwrap_or(0.0);
                    (column.to_key_string(), value)
                })
                .collect();
            table.rows.push(row_key.clone());
            table.data.insert(row_key, data);
        }
        table
    }
}
