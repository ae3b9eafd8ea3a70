//! Promotions Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use tiffin::{
    orders::UnknownOption,
    promotions::{DiscountKind, DiscountRule, InvalidPromo, RuleScope},
};

use crate::{
    database::{decode_error, try_get_currency, try_get_price},
    domain::promotions::errors::RedemptionError,
};

const GET_PROMOTION_SQL: &str = include_str!("sql/get_promotion.sql");
const LIST_AUTO_OFFERS_SQL: &str = include_str!("sql/list_auto_offers.sql");
const UPSERT_PROMOTION_SQL: &str = include_str!("sql/upsert_promotion.sql");
const RECORD_REDEMPTION_SQL: &str = include_str!("sql/record_redemption.sql");
const PROMOTION_EXISTS_SQL: &str = include_str!("sql/promotion_exists.sql");

const KIND_PERCENTAGE: &str = "percentage";
const KIND_FIXED: &str = "fixed";
const SCOPE_CODE_REDEEMED: &str = "code_redeemed";
const SCOPE_AUTO_APPLIED: &str = "auto_applied";

/// A `promotions` row.
struct PromotionRow(DiscountRule);

/// Discount rules keyed by their upper-case code.
#[derive(Debug, Clone, Default)]
pub(crate) struct PgPromotionsRepository;

impl PgPromotionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// The rule for a code, matched case-insensitively.
    pub(crate) async fn find_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<Option<DiscountRule>, sqlx::Error> {
        let row = query_as::<Postgres, PromotionRow>(GET_PROMOTION_SQL)
            .bind(code.trim().to_uppercase())
            .fetch_optional(&mut **tx)
            .await?;

        Ok(row.map(|PromotionRow(rule)| rule))
    }

    /// Every auto-applied rule, whether or not it is currently valid.
    pub(crate) async fn auto_offers(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<DiscountRule>, sqlx::Error> {
        let rows = query_as::<Postgres, PromotionRow>(LIST_AUTO_OFFERS_SQL)
            .fetch_all(&mut **tx)
            .await?;

        Ok(rows.into_iter().map(|PromotionRow(rule)| rule).collect())
    }

    /// Creates a rule or replaces its terms. An existing rule keeps its use count.
    ///
    /// Amounts are stored in minor units of `currency`.
    pub(crate) async fn upsert_rule(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        rule: &DiscountRule,
        currency: &'static Currency,
    ) -> Result<(), sqlx::Error> {
        let (kind, percent, amount) = match rule.kind {
            DiscountKind::Percentage(_) => (KIND_PERCENTAGE, rule.kind.percent(), None),
            DiscountKind::Fixed(amount) => (KIND_FIXED, None, Some(amount.to_minor_units())),
        };

        query(UPSERT_PROMOTION_SQL)
            .bind(&rule.code)
            .bind(&rule.description)
            .bind(rule.badge.as_deref())
            .bind(kind)
            .bind(percent)
            .bind(amount)
            .bind(currency.iso_alpha_code)
            .bind(rule.min_order.map(|min| min.to_minor_units()))
            .bind(rule.max_uses.map(try_i32_from_u32).transpose()?)
            .bind(try_i32_from_u32(rule.uses_count)?)
            .bind(rule.active)
            .bind(rule.valid_from.map(SqlxTimestamp::from))
            .bind(rule.valid_until.map(SqlxTimestamp::from))
            .bind(scope_to_str(rule.scope))
            .bind(rule.first_order_only)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Counts one use of a code, returning the new use count.
    ///
    /// The cap is checked by the same statement that increments the count, and the row stays
    /// locked until the transaction ends, so two checkouts racing for the last use cannot
    /// both succeed.
    pub(crate) async fn record_redemption(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<u32, RedemptionError> {
        let uses_count = query_scalar::<Postgres, i32>(RECORD_REDEMPTION_SQL)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await?;

        if let Some(uses_count) = uses_count {
            return u32::try_from(uses_count)
                .map_err(|e| RedemptionError::from(decode_error("uses_count", e)));
        }

        let exists = query_scalar::<Postgres, bool>(PROMOTION_EXISTS_SQL)
            .bind(code)
            .fetch_one(&mut **tx)
            .await?;

        let reason = if exists {
            InvalidPromo::Exhausted
        } else {
            InvalidPromo::Inactive
        };

        Err(RedemptionError::Rejected(reason))
    }
}

fn scope_to_str(scope: RuleScope) -> &'static str {
    match scope {
        RuleScope::CodeRedeemed => SCOPE_CODE_REDEEMED,
        RuleScope::AutoApplied => SCOPE_AUTO_APPLIED,
    }
}

fn try_i32_from_u32(value: u32) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

fn try_u32_from_i32(value: i32, column: &str) -> Result<u32, sqlx::Error> {
    u32::try_from(value).map_err(|e| decode_error(column, e))
}

impl<'r> FromRow<'r, PgRow> for PromotionRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let currency = try_get_currency(row)?;

        let kind: String = row.try_get("discount_kind")?;
        let kind = match kind.as_str() {
            KIND_PERCENTAGE => {
                let percent: Decimal = row.try_get("discount_percent")?;

                DiscountKind::percent_off(percent).map_err(|e| decode_error("discount_percent", e))?
            }
            KIND_FIXED => DiscountKind::amount_off(try_get_price(row, "discount_amount", currency)?)
                .map_err(|e| decode_error("discount_amount", e))?,
            other => return Err(decode_error("discount_kind", UnknownOption(other.to_string()))),
        };

        let scope: String = row.try_get("scope")?;
        let scope = match scope.as_str() {
            SCOPE_CODE_REDEEMED => RuleScope::CodeRedeemed,
            SCOPE_AUTO_APPLIED => RuleScope::AutoApplied,
            other => return Err(decode_error("scope", UnknownOption(other.to_string()))),
        };

        let min_order = row
            .try_get::<Option<i64>, _>("min_order")?
            .map(|minor| Money::from_minor(minor, currency));

        Ok(Self(DiscountRule {
            code: row.try_get("code")?,
            description: row.try_get("description")?,
            badge: row.try_get("badge")?,
            kind,
            min_order,
            max_uses: row
                .try_get::<Option<i32>, _>("max_uses")?
                .map(|max| try_u32_from_i32(max, "max_uses"))
                .transpose()?,
            uses_count: try_u32_from_i32(row.try_get("uses_count")?, "uses_count")?,
            active: row.try_get("active")?,
            valid_from: row
                .try_get::<Option<SqlxTimestamp>, _>("valid_from")?
                .map(SqlxTimestamp::to_jiff),
            valid_until: row
                .try_get::<Option<SqlxTimestamp>, _>("valid_until")?
                .map(SqlxTimestamp::to_jiff),
            scope,
            first_order_only: row.try_get("first_order_only")?,
        }))
    }
}
