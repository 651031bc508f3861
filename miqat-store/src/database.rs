use miqat_catalog::PricingRules;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

#[derive(sqlx::FromRow)]
struct RuleRow {
    rule_key: String,
    rule_value: Value,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlays `business_rules` rows on the configured pricing rules.
    /// Rows look like `("tax_percent", {"value": 5})`.
    pub async fn fetch_pricing_rules(&self, defaults: PricingRules) -> Result<PricingRules, sqlx::Error> {
        let rows: Vec<RuleRow> =
            sqlx::query_as("SELECT rule_key, rule_value FROM business_rules")
                .fetch_all(&self.pool)
                .await?;

        Ok(apply_rule_rows(
            defaults,
            rows.into_iter().map(|row| (row.rule_key, row.rule_value)),
        ))
    }
}

fn apply_rule_rows<I>(defaults: PricingRules, rows: I) -> PricingRules
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut rules = defaults;
    for (key, value) in rows {
        let Some(number) = value.get("value").and_then(Value::as_f64) else {
            warn!(rule_key = %key, "Ignoring business rule without a numeric value");
            continue;
        };
        match key.as_str() {
            "markup_percent" => rules.markup_percent = number,
            "tax_percent" => rules.tax_percent = number,
            _ => {}
        }
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_rows_override_defaults() {
        let rules = apply_rule_rows(
            PricingRules {
                markup_percent: 5.0,
                tax_percent: 0.0,
            },
            vec![
                ("tax_percent".to_string(), json!({"value": 16})),
                ("markup_percent".to_string(), json!({"value": "high"})),
                ("unknown".to_string(), json!({"value": 1})),
            ],
        );
        assert_eq!(rules.tax_percent, 16.0);
        assert_eq!(rules.markup_percent, 5.0);
    }
}
