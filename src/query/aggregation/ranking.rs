//! 排名
//!
//! 使用序数排名：值相同的记录也获得严格递增的名次

use std::collections::BTreeMap;

use crate::core::{Record, Value};

pub const RANK: &str = "rank";

pub struct RankingEngine;

impl RankingEngine {
    /// 为已排序的行分配名次
    ///
    /// 有分区字段时，分区按首次出现的顺序输出，每个分区从 1 开始；
    /// 分区内保持输入顺序
    pub fn assign(rows: Vec<Record>, partition: Option<&str>) -> Vec<Record> {
        let Some(partition) = partition else {
            return Self::number(rows);
        };

        let mut order: Vec<Vec<Record>> = Vec::new();
        let mut index: BTreeMap<Value, usize> = BTreeMap::new();
        for row in rows {
            let key = row.get(partition).clone();
            let slot = *index.entry(key).or_insert_with(|| {
                order.push(Vec::new());
                order.len() - 1
            });
            order[slot].push(row);
        }

        order.into_iter().flat_map(Self::number).collect()
    }

    fn number(rows: Vec<Record>) -> Vec<Record> {
        rows.into_iter()
            .zip(1i64..)
            .map(|(mut row, rank)| {
                row.set(RANK, rank);
                row
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores() -> Vec<Record> {
        // 已按 score 降序
        vec![
            Record::new().with("name", "a").with("team", "red").with("score", 90),
            Record::new().with("name", "b").with("team", "blue").with("score", 80),
            Record::new().with("name", "c").with("team", "red").with("score", 80),
            Record::new().with("name", "d").with("team", "blue").with("score", 70),
        ]
    }

    fn ranks(rows: &[Record]) -> Vec<(String, i64)> {
        rows.iter()
            .map(|r| {
                let name = r.get("name").as_str().unwrap_or_default().to_string();
                let rank = match r.get(RANK) {
                    Value::Int(i) => *i,
                    _ => -1,
                };
                (name, rank)
            })
            .collect()
    }

    #[test]
    fn test_ties_get_distinct_ranks() {
        let ranked = RankingEngine::assign(scores(), None);
        assert_eq!(
            ranks(&ranked),
            vec![
                ("a".to_string(), 1),
                ("b".to_string(), 2),
                ("c".to_string(), 3),
                ("d".to_string(), 4)
            ]
        );
    }

    #[test]
    fn test_partitioned_ranking() {
        let ranked = RankingEngine::assign(scores(), Some("team"));
        assert_eq!(
            ranks(&ranked),
            vec![
                ("a".to_string(), 1),
                ("c".to_string(), 2),
                ("b".to_string(), 1),
                ("d".to_string(), 2)
            ]
        );
    }
}
