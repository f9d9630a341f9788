//! SQL bindings for the reducers in `aggregate`.
//!
//! Registered on every store connection:
//! `agg_median(x)`, `agg_mean(x, weight)`, `agg_first(x)` and
//! `time_group(interval, ts)`.

use crate::aggregate::{FirstReducer, MedianReducer, Reducer, TimeGrouper, WeightedMeanReducer};
use rusqlite::functions::{Aggregate, Context, FunctionFlags};
use rusqlite::types::Value;
use rusqlite::{Connection, Error, Result};
use std::sync::{Arc, Mutex};

struct Median;

impl Aggregate<MedianReducer, Option<f64>> for Median {
    fn init(&self, _: &mut Context<'_>) -> Result<MedianReducer> {
        Ok(MedianReducer::default())
    }

    fn step(&self, ctx: &mut Context<'_>, acc: &mut MedianReducer) -> Result<()> {
        acc.step(ctx.get::<Option<f64>>(0)?);
        Ok(())
    }

    fn finalize(&self, _: &mut Context<'_>, acc: Option<MedianReducer>) -> Result<Option<f64>> {
        Ok(acc.and_then(|acc| acc.finalize()))
    }
}

struct WeightedMean;

impl Aggregate<WeightedMeanReducer, Option<f64>> for WeightedMean {
    fn init(&self, _: &mut Context<'_>) -> Result<WeightedMeanReducer> {
        Ok(WeightedMeanReducer::default())
    }

    fn step(&self, ctx: &mut Context<'_>, acc: &mut WeightedMeanReducer) -> Result<()> {
        let value = ctx.get::<Option<f64>>(0)?;
        let weight = ctx.get::<Option<f64>>(1)?;
        if let (Some(value), Some(weight)) = (value, weight) {
            acc.step((value, weight));
        }
        Ok(())
    }

    fn finalize(
        &self,
        _: &mut Context<'_>,
        acc: Option<WeightedMeanReducer>,
    ) -> Result<Option<f64>> {
        Ok(acc.and_then(|acc| acc.finalize()))
    }
}

struct First;

impl Aggregate<FirstReducer<Value>, Value> for First {
    fn init(&self, _: &mut Context<'_>) -> Result<FirstReducer<Value>> {
        Ok(FirstReducer::default())
    }

    fn step(&self, ctx: &mut Context<'_>, acc: &mut FirstReducer<Value>) -> Result<()> {
        let value = match ctx.get::<Value>(0)? {
            Value::Null => None,
            other => Some(other),
        };
        acc.step(value);
        Ok(())
    }

    fn finalize(&self, _: &mut Context<'_>, acc: Option<FirstReducer<Value>>) -> Result<Value> {
        Ok(acc.and_then(|acc| acc.finalize()).unwrap_or(Value::Null))
    }
}

/// Register the aggregates and the time grouping function on `conn`.
/// `grouper` is shared with the owning store so it can be reset between
/// grouped reads.
pub fn register(conn: &Connection, grouper: Arc<Mutex<TimeGrouper>>) -> Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
    conn.create_aggregate_function("agg_median", 1, flags, Median)?;
    conn.create_aggregate_function("agg_mean", 2, flags, WeightedMean)?;
    conn.create_aggregate_function("agg_first", 1, flags, First)?;

    // stateful, so not deterministic
    conn.create_scalar_function("time_group", 2, FunctionFlags::SQLITE_UTF8, move |ctx| {
        let interval: f64 = ctx.get(0)?;
        let timestamp: f64 = ctx.get(1)?;
        let mut grouper = grouper
            .lock()
            .map_err(|_| Error::UserFunctionError("time grouper lock poisoned".into()))?;
        grouper.set_interval(interval);
        Ok(grouper.next(timestamp) as i64)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> (Connection, Arc<Mutex<TimeGrouper>>) {
        let conn = Connection::open_in_memory().unwrap();
        let grouper = Arc::new(Mutex::new(TimeGrouper::new(0.0)));
        register(&conn, Arc::clone(&grouper)).unwrap();
        conn.execute_batch(
            "create table t (k text, x real, c integer, w real);
             create index t_w on t(w);
             insert into t values ('a', 1.0, 1, 100.0), ('a', 3.0, 3, 110.0), ('a', 2.0, 0, 120.0),
                                  ('b', null, 1, 1000.0), ('b', 5.0, 2, 1010.0);",
        )
        .unwrap();
        (conn, grouper)
    }

    #[test]
    fn median_and_weighted_mean_in_sql() {
        let (conn, _) = conn();
        let (median, mean): (f64, f64) = conn
            .query_row(
                "select agg_median(x), agg_mean(x, c) from t where k = 'a'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(median, 2.0);
        // the zero-count row is skipped: (1*1 + 3*3) / 4
        assert_eq!(mean, 2.5);
    }

    #[test]
    fn median_of_only_nulls_is_null() {
        let (conn, _) = conn();
        let median: Option<f64> = conn
            .query_row("select agg_median(x) from t where k = 'zzz'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(median, None);
    }

    #[test]
    fn first_skips_nulls() {
        let (conn, _) = conn();
        let first: f64 = conn
            .query_row(
                "select agg_first(x) from (select x from t where k = 'b' order by w)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(first, 5.0);
    }

    #[test]
    fn time_group_counts_sittings() {
        let (conn, grouper) = conn();
        let sittings: i64 = conn
            .query_row(
                "select max(time_group(60.0, w)) from (select w from t order by w)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(sittings, 2);

        grouper.lock().unwrap().reset();
        let again: i64 = conn
            .query_row(
                "select max(time_group(60.0, w)) from (select w from t order by w)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(again, 2);
    }
}
