//! Synthetic dataset seeding
//! Fills TB_CUSTOMER and TB_TRANSACTION with random but plausible withdrawal data

use chrono::{Duration, Local, Months, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SiranioConfig;
use crate::errors::Result;
use crate::rules::Channel;
use crate::storage::Store;
use crate::{utils, Customer, WithdrawalTransaction};

pub const REGIONS: [&str; 11] = [
    "서울", "경기", "부산", "대구", "인천", "광주", "대전", "울산", "세종", "강원", "제주",
];

pub const CHANNELS: [Channel; 3] = [Channel::Atm, Channel::Counter, Channel::Online];

const GENDERS: [&str; 2] = ["M", "F"];

/// Share of withdrawals drawn from the high-amount band
const HIGH_AMOUNT_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub customers_inserted: u64,
    pub transactions_inserted: u64,
    pub customer_count: i64,
    pub transaction_count: i64,
}

/// Top up customers and withdrawals when either table is below its target
pub async fn seed_dataset<R: Rng + ?Sized>(
    store: &Store,
    config: &SiranioConfig,
    rng: &mut R,
) -> Result<SeedReport> {
    let today = Local::now().date_naive();
    let mut report = SeedReport::default();

    let customer_count = store.count_rows("TB_CUSTOMER").await?;
    if customer_count < i64::from(config.customer_target_count) {
        let customers = synthetic_customers(config.customer_target_count, today, rng);
        report.customers_inserted = store.insert_customers(&customers).await?;
        info!(inserted = report.customers_inserted, "seeded customers");
    }

    let transaction_count = store.count_rows("TB_TRANSACTION").await?;
    if transaction_count < i64::from(config.transaction_target_count) {
        let customer_ids = store.customer_ids().await?;
        if !customer_ids.is_empty() {
            let transactions = synthetic_transactions(
                config.transaction_target_count,
                &customer_ids,
                today,
                rng,
            );
            report.transactions_inserted = store.insert_transactions(&transactions).await?;
            info!(inserted = report.transactions_inserted, "seeded transactions");
        }
    }

    report.customer_count = store.count_rows("TB_CUSTOMER").await?;
    report.transaction_count = store.count_rows("TB_TRANSACTION").await?;
    Ok(report)
}

/// Customers `C0001`.. with ages 0-80, registered within the last five years
pub fn synthetic_customers<R: Rng + ?Sized>(
    count: u32,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<Customer> {
    let since = today.checked_sub_months(Months::new(60)).unwrap_or(today);

    (1..=count)
        .map(|idx| Customer {
            customer_id: format!("C{:04}", idx),
            age: rng.gen_range(0..=80),
            gender: GENDERS.choose(rng).copied().unwrap_or(GENDERS[0]).to_string(),
            region: REGIONS.choose(rng).copied().unwrap_or(REGIONS[0]).to_string(),
            reg_date: random_date(since, today, rng).format("%Y-%m-%d").to_string(),
        })
        .collect()
}

/// Withdrawals over the last year, spread uniformly across the clock
pub fn synthetic_transactions<R: Rng + ?Sized>(
    count: u32,
    customer_ids: &[String],
    today: NaiveDate,
    rng: &mut R,
) -> Vec<WithdrawalTransaction> {
    let since = today.checked_sub_months(Months::new(12)).unwrap_or(today);
    let mut transactions = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let Some(customer_id) = customer_ids.choose(rng) else {
            break;
        };
        let date = random_date(since, today, rng).format("%Y-%m-%d").to_string();
        let time = utils::format_clock(
            rng.gen_range(0..24),
            rng.gen_range(0..60),
            rng.gen_range(0..60),
        );
        let amount: u32 = if rng.gen_bool(HIGH_AMOUNT_RATIO) {
            rng.gen_range(2_000_000..=15_000_000)
        } else {
            rng.gen_range(10_000..=1_000_000)
        };
        let channel = CHANNELS.choose(rng).copied().unwrap_or(Channel::Atm);

        transactions.push(WithdrawalTransaction {
            customer_id: customer_id.clone(),
            date,
            time,
            amount: f64::from(amount),
            channel: channel.value().to_string(),
        });
    }

    transactions
}

fn random_date<R: Rng + ?Sized>(from: NaiveDate, to: NaiveDate, rng: &mut R) -> NaiveDate {
    let span = (to - from).num_days().max(0);
    from + Duration::days(rng.gen_range(0..=span))
}
