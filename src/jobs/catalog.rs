//! Built-in dashboard datasets.
//!
//! Ticker lists and date windows are fixed here and always sent as bound
//! values. The underlying models live in `STOCKS_ELT_DB.PREP`.

use crate::export::ExportFormat;
use crate::warehouse::QueryBuilder;

use super::types::{ExportSpec, JobDefinition};

const AAPL: &str = "AAPL";
const AAPL_LOOKBACK_DAYS: i64 = 90;

const ACTIVITY_TICKERS: &[&str] = &[
    "AAPL", "AMZN", "GME", "GOOGL", "IWM", "MSFT", "NVDA", "QQQ", "SPY", "TSLA",
];
const ACTIVITY_WINDOW: (&str, &str) = ("2025-09-01", "2025-11-30");

const FEATURE_TICKERS: &[&str] = &[
    "AAPL", "AMZN", "GOOGL", "MSFT", "NVDA", "TICKER6", "TICKER7", "TICKER8",
];
const FEATURE_WINDOW: (&str, &str) = ("2025-09-02", "2025-11-28");

const TOP_CONTRACT_TICKERS: &[&str] = &["AAPL", "AMZN", "GME", "GOOGL", "MSFT", "NVDA", "QQQ", "SPY"];

const MAG7_TICKERS: &[&str] = &["AAPL", "AMZN", "GOOGL", "META", "MSFT", "NVDA", "TSLA"];
const MACRO_TICKERS: &[&str] = &["IWM", "QQQ", "SPY", "TLT"];
const CHAOS_TICKERS: &[&str] = &["GME", "IBIT", "RDDT", "VIX"];
const DASHBOARD_WINDOW: (&str, &str) = ("2025-06-30", "2025-12-19");

/// Every built-in job, in `--all` execution order.
pub fn catalog() -> Vec<JobDefinition> {
    vec![
        aapl_daily_activity(),
        aapl_options_top_contracts(),
        aapl_options_chain_snapshot(),
        tickers_daily_activity(),
        tickers_features_daily(),
        tickers_options_top_contracts(),
        core_chaos(),
    ]
}

/// Looks up a job by its CLI name.
pub fn find_job(name: &str) -> Option<JobDefinition> {
    catalog().into_iter().find(|job| job.name == name)
}

/// CLI names of all jobs.
pub fn job_names() -> Vec<&'static str> {
    catalog().iter().map(|job| job.name).collect()
}

fn push_tickers(qb: &mut QueryBuilder, tickers: &[&str]) {
    let mut list = qb.separated(", ");
    for ticker in tickers {
        list.push_bind(*ticker);
    }
}

fn push_window(qb: &mut QueryBuilder, column: &str, (start, end): (&str, &str)) {
    qb.push(column)
        .push(" between to_date(")
        .push_bind(start)
        .push(") and to_date(")
        .push_bind(end)
        .push(")");
}

fn aapl_daily_activity() -> JobDefinition {
    let mut qb = QueryBuilder::new(
        "select
    trade_date,
    ticker,
    underlying_close_price,
    total_option_volume,
    volume_7d_avg
from STOCKS_ELT_DB.PREP.INT_POLYGON__TICKER_DAILY_ACTIVITY
where ticker = ",
    );
    qb.push_bind(AAPL)
        .push("\n  and trade_date >= dateadd(day, ")
        .push_bind(-AAPL_LOOKBACK_DAYS)
        .push(", current_date)\norder by trade_date");

    JobDefinition {
        name: "aapl-daily-activity",
        description: "AAPL close price and option volume, trailing 90 days",
        exports: vec![ExportSpec {
            label: "AAPL daily activity",
            file_name: "aapl_daily_activity.json",
            format: ExportFormat::Json,
            query: qb.build(),
        }],
    }
}

fn aapl_options_top_contracts() -> JobDefinition {
    let mut qb = QueryBuilder::new(
        "with latest_trade_date as (
    select max(trade_date) as trade_date
    from STOCKS_ELT_DB.PREP.INT_POLYGON__OPTIONS_CHAIN_DAILY
    where underlying_ticker = ",
    );
    qb.push_bind(AAPL).push(
        "
),
filtered as (
    select
        t.option_symbol,
        t.underlying_ticker,
        t.trade_date,
        t.expiration_date,
        t.option_type,
        t.strike_price,
        t.option_close_price,
        t.option_volume,
        t.days_to_expiration,
        t.signed_moneyness_pct
    from STOCKS_ELT_DB.PREP.INT_POLYGON__OPTIONS_CHAIN_DAILY t
    join latest_trade_date d
      on t.trade_date = d.trade_date
    where t.underlying_ticker = ",
    );
    // near-term, near-the-money
    qb.push_bind(AAPL).push(
        "
      and t.days_to_expiration between 0 and 30
      and abs(t.signed_moneyness_pct) <= 0.15
)
select
    option_symbol,
    underlying_ticker,
    trade_date,
    expiration_date,
    option_type,
    strike_price,
    option_close_price,
    option_volume,
    days_to_expiration,
    signed_moneyness_pct
from filtered
order by option_volume desc, expiration_date, strike_price
limit 15",
    );

    JobDefinition {
        name: "aapl-options-top-contracts",
        description: "15 most traded near-term, near-the-money AAPL contracts on the latest trade date",
        exports: vec![ExportSpec {
            label: "AAPL options top contracts",
            file_name: "aapl_options_top_contracts.json",
            format: ExportFormat::Json,
            query: qb.build(),
        }],
    }
}

fn aapl_options_chain_snapshot() -> JobDefinition {
    let mut qb = QueryBuilder::new(
        "with latest_date as (
    select max(trade_date) as trade_date
    from STOCKS_ELT_DB.PREP.INT_POLYGON__OPTIONS_CHAIN_DAILY
    where underlying_ticker = ",
    );
    qb.push_bind(AAPL).push(
        "
)
select
    option_symbol,
    underlying_ticker,
    trade_date,
    expiration_date,
    option_type,
    strike_price,
    option_open_price,
    option_high_price,
    option_low_price,
    option_close_price,
    option_vwap,
    option_volume,
    option_trades,
    underlying_open_price,
    underlying_high_price,
    underlying_low_price,
    underlying_close_price,
    underlying_vwap,
    underlying_volume,
    underlying_trades,
    days_to_expiration,
    signed_moneyness_raw,
    signed_moneyness_pct,
    option_aggregates_timestamp,
    underlying_aggregates_timestamp,
    option_inserted_at,
    underlying_inserted_at,
    option_load_date,
    underlying_load_date,
    option_filename,
    underlying_filename,
    missing_underlying_flag
from STOCKS_ELT_DB.PREP.INT_POLYGON__OPTIONS_CHAIN_DAILY c
join latest_date d
  on c.trade_date = d.trade_date
where c.underlying_ticker = ",
    );
    qb.push_bind(AAPL).push(
        "
order by
    expiration_date,
    option_type desc,
    strike_price",
    );

    JobDefinition {
        name: "aapl-options-chain-snapshot",
        description: "Full AAPL options chain for the latest trade date (CSV)",
        exports: vec![ExportSpec {
            label: "AAPL options chain snapshot",
            file_name: "aapl_options_chain_snapshot.csv",
            format: ExportFormat::Csv,
            query: qb.build(),
        }],
    }
}

fn tickers_daily_activity() -> JobDefinition {
    let mut qb = QueryBuilder::new(
        "select
    trade_date,
    ticker,
    underlying_close_price,
    total_option_volume,
    volume_7d_avg
from STOCKS_ELT_DB.PREP.INT_MASSIVE__TICKER_VOLUME_DAILY
where ticker in (",
    );
    push_tickers(&mut qb, ACTIVITY_TICKERS);
    qb.push(")\n  and ");
    push_window(&mut qb, "trade_date", ACTIVITY_WINDOW);
    qb.push("\norder by ticker, trade_date");

    JobDefinition {
        name: "tickers-daily-activity",
        description: "Daily close price and option volume for the activity tickers",
        exports: vec![ExportSpec {
            label: "ticker daily activity",
            file_name: "daily_activity_8tickers.json",
            format: ExportFormat::Json,
            query: qb.build(),
        }],
    }
}

fn tickers_features_daily() -> JobDefinition {
    let mut qb = QueryBuilder::new(
        "select
    trade_date,
    underlying_ticker,
    underlying_close_price as close_price,
    return_1d,
    return_5d,
    realized_vol_20d_annualized,
    underlying_volume,
    option_volume_total,
    option_volume_30d_avg,
    option_volume_vs_30d,
    call_put_ratio
from STOCKS_ELT_DB.PREP.INT_POLYGON__TICKER_FEATURES_DAILY
where underlying_ticker in (",
    );
    push_tickers(&mut qb, FEATURE_TICKERS);
    qb.push(")\n  and ");
    push_window(&mut qb, "trade_date", FEATURE_WINDOW);
    qb.push("\norder by trade_date, underlying_ticker");

    JobDefinition {
        name: "tickers-features-daily",
        description: "Daily return, volatility and option-flow features per ticker",
        exports: vec![ExportSpec {
            label: "ticker features",
            file_name: "ticker_features_daily_8tickers.json",
            format: ExportFormat::Json,
            query: qb.build(),
        }],
    }
}

fn tickers_options_top_contracts() -> JobDefinition {
    let mut qb = QueryBuilder::new(
        "with bounds as (
    select
        underlying_ticker,
        max(trade_date) as max_trade_date,
        dateadd(day, -59, max(trade_date)) as min_trade_date
    from STOCKS_ELT_DB.PREP.INT_MASSIVE__OPTIONS_CHAIN_DAILY
    where underlying_ticker in (",
    );
    push_tickers(&mut qb, TOP_CONTRACT_TICKERS);
    qb.push(
        ")
    group by underlying_ticker
),
base as (
    select
        t.option_symbol,
        t.underlying_ticker,
        t.expiration_date,
        t.option_type,
        t.strike_price,
        t.option_close_price,
        t.option_volume,
        t.signed_moneyness_pct,
        t.trade_date,
        b.max_trade_date
    from STOCKS_ELT_DB.PREP.INT_MASSIVE__OPTIONS_CHAIN_DAILY t
    join bounds b
      on t.underlying_ticker = b.underlying_ticker
     and t.trade_date between b.min_trade_date and b.max_trade_date
    where t.underlying_ticker in (",
    );
    push_tickers(&mut qb, TOP_CONTRACT_TICKERS);
    qb.push(
        ")
),
agg as (
    select
        option_symbol,
        underlying_ticker,
        expiration_date,
        option_type,
        strike_price,
        sum(option_volume)        as total_volume,
        avg(signed_moneyness_pct) as avg_signed_moneyness_pct,
        max(max_trade_date)       as max_trade_date
    from base
    group by
        option_symbol,
        underlying_ticker,
        expiration_date,
        option_type,
        strike_price
),
last_close as (
    select
        option_symbol,
        option_close_price as latest_close_price,
        trade_date,
        row_number() over (
            partition by option_symbol
            order by trade_date desc
        ) as rn
    from base
),
joined as (
    select
        a.option_symbol,
        a.underlying_ticker,
        a.expiration_date,
        a.option_type,
        a.strike_price,
        lc.latest_close_price,
        a.total_volume,
        datediff('day', a.max_trade_date, a.expiration_date) as days_to_expiration,
        a.avg_signed_moneyness_pct as signed_moneyness_pct
    from agg a
    join last_close lc
      on lc.option_symbol = a.option_symbol
     and lc.rn = 1
),
ranked as (
    select
        *,
        row_number() over (
            partition by underlying_ticker
            order by total_volume desc, expiration_date, strike_price
        ) as rn
    from joined
)
select
    option_symbol,
    underlying_ticker,
    expiration_date,
    option_type,
    strike_price,
    latest_close_price,
    total_volume,
    days_to_expiration,
    signed_moneyness_pct
from ranked
where rn <= 25
order by underlying_ticker, total_volume desc, expiration_date, strike_price",
    );

    JobDefinition {
        name: "tickers-options-top-contracts",
        description: "Top 25 contracts per ticker by volume over each ticker's last 60 trade days",
        exports: vec![ExportSpec {
            label: "ticker options top contracts",
            file_name: "options_top_contracts_8tickers.json",
            format: ExportFormat::Json,
            query: qb.build(),
        }],
    }
}

fn core_chaos() -> JobDefinition {
    let mut mag7 = QueryBuilder::new(
        "select *
from STOCKS_ELT_DB.PREP.INT_MASSIVE__STOCKS_OPTIONS_MAG7_MOMENTUM
where ",
    );
    push_window(&mut mag7, "trade_date", DASHBOARD_WINDOW);
    mag7.push("\norder by trade_date desc, underlying_ticker asc");

    let mut gravity = QueryBuilder::new(
        "select *
from STOCKS_ELT_DB.PREP.INT_MASSIVE__STOCKS_OPTIONS_MACRO_GRAVITY
where ",
    );
    push_window(&mut gravity, "trade_date", DASHBOARD_WINDOW);
    gravity.push("\norder by trade_date desc, underlying_ticker asc");

    let all_tickers: Vec<&str> = MAG7_TICKERS
        .iter()
        .chain(MACRO_TICKERS)
        .chain(CHAOS_TICKERS)
        .copied()
        .collect();

    // Volume summed per contract over the window, priced at each ticker's
    // last trade date, top 25 per ticker.
    let mut top = QueryBuilder::new(
        "with bounds as (
    select underlying_ticker, max(trade_date) as max_date
    from STOCKS_ELT_DB.PREP.INT_MASSIVE__OPTIONS_CHAIN_DAILY
    where ",
    );
    push_window(&mut top, "trade_date", DASHBOARD_WINDOW);
    top.push("\n      and underlying_ticker in (");
    push_tickers(&mut top, &all_tickers);
    top.push(
        ")
    group by 1
),
base as (
    select t.* from STOCKS_ELT_DB.PREP.INT_MASSIVE__OPTIONS_CHAIN_DAILY t
    where ",
    );
    push_window(&mut top, "t.trade_date", DASHBOARD_WINDOW);
    top.push("\n      and t.underlying_ticker in (");
    push_tickers(&mut top, &all_tickers);
    top.push(
        ")
),
agg as (
    select
        option_symbol, underlying_ticker, expiration_date, option_type, strike_price,
        sum(option_volume) as total_volume,
        avg(signed_moneyness_pct) as avg_moneyness
    from base
    group by 1, 2, 3, 4, 5
),
latest as (
    select t.option_symbol, t.option_close_price, t.trade_date
    from base t
    join bounds b
      on t.underlying_ticker = b.underlying_ticker
      and t.trade_date = b.max_date
)
select
    a.option_symbol, a.underlying_ticker, a.expiration_date, a.option_type, a.strike_price,
    a.total_volume,
    l.option_close_price as latest_close_price,
    a.avg_moneyness as signed_moneyness_pct
from agg a
join latest l on a.option_symbol = l.option_symbol
qualify row_number() over (partition by a.underlying_ticker order by a.total_volume desc) <= 25
order by a.underlying_ticker, a.total_volume desc",
    );

    JobDefinition {
        name: "core-chaos",
        description: "Mag 7 momentum, macro gravity and top contracts for the core & chaos dashboard",
        exports: vec![
            ExportSpec {
                label: "Mag 7 momentum",
                file_name: "dashboard_mag7_momentum.json",
                format: ExportFormat::Json,
                query: mag7.build(),
            },
            ExportSpec {
                label: "macro gravity",
                file_name: "dashboard_macro_gravity.json",
                format: ExportFormat::Json,
                query: gravity.build(),
            },
            ExportSpec {
                label: "top contracts",
                file_name: "dashboard_top_contracts.json",
                format: ExportFormat::Json,
                query: top.build(),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::BindValue;
    use std::collections::HashSet;

    #[test]
    fn test_job_names_are_unique() {
        let names = job_names();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), unique.len());
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_output_files_are_unique_and_match_format() {
        let mut seen = HashSet::new();
        for job in catalog() {
            for export in &job.exports {
                assert!(seen.insert(export.file_name), "{} reused", export.file_name);
                assert!(
                    export.file_name.ends_with(export.format.extension()),
                    "{} does not end with .{}",
                    export.file_name,
                    export.format.extension()
                );
            }
        }
    }

    #[test]
    fn test_placeholders_match_binds() {
        for job in catalog() {
            for export in &job.exports {
                let placeholders = export.query.sql().matches('?').count();
                assert_eq!(
                    placeholders,
                    export.query.binds().len(),
                    "{} / {}",
                    job.name,
                    export.label
                );
            }
        }
    }

    #[test]
    fn test_tickers_and_dates_are_bound_not_inlined() {
        for job in catalog() {
            for export in &job.exports {
                let sql = export.query.sql();
                assert!(!sql.contains("'AAPL'"), "{}: ticker inlined", job.name);
                assert!(!sql.contains("'2025-"), "{}: date inlined", job.name);
            }
        }
    }

    #[test]
    fn test_find_job() {
        let job = find_job("core-chaos").expect("core-chaos exists");
        assert_eq!(
            job.file_names().collect::<Vec<_>>(),
            vec![
                "dashboard_mag7_momentum.json",
                "dashboard_macro_gravity.json",
                "dashboard_top_contracts.json",
            ]
        );
        assert!(find_job("no-such-job").is_none());
    }

    #[test]
    fn test_top_contracts_binds_all_fifteen_tickers_twice() {
        let job = find_job("core-chaos").unwrap();
        let top = &job.exports[2].query;
        let tickers = top
            .binds()
            .iter()
            .filter(|b| matches!(b, BindValue::Text(t) if !t.starts_with("2025-")))
            .count();
        assert_eq!(tickers, 30);
    }

    #[test]
    fn test_aapl_daily_activity_binds_lookback() {
        let job = find_job("aapl-daily-activity").unwrap();
        assert_eq!(
            job.exports[0].query.binds(),
            &[BindValue::Text("AAPL".into()), BindValue::Integer(-90)]
        );
    }
}
