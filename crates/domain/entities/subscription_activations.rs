use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::subscription_activations;

/// Proof that `order_id` paid for the subscription's period containing `activation_date`.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_activations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubscriptionActivationEntity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub subscription_id: Uuid,
    pub activation_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = subscription_activations)]
pub struct InsertSubscriptionActivationEntity {
    pub order_id: Uuid,
    pub subscription_id: Uuid,
    pub activation_date: DateTime<Utc>,
}
