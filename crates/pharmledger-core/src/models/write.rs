use serde::{Deserialize, Serialize};

/// Field values of one day's reconciliation entry, as submitted by a client.
///
/// Nothing here is cross-checked: `discrepancy` is stored as supplied and
/// `date` is free text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "WireEntry")]
pub struct LedgerEntryCommand {
    pub date: String,
    #[serde(default)]
    pub total_sale: f64,
    #[serde(default)]
    pub cash_sale: f64,
    #[serde(default)]
    pub card_sale: f64,
    #[serde(default)]
    pub talabat_sale: f64,
    #[serde(default)]
    pub insurance_sale: f64,
    #[serde(default)]
    pub credit_sale: f64,
    #[serde(default)]
    pub med_purchase: f64,
    #[serde(default)]
    pub other_exp: f64,
    /// Cash collected by the owner. Clients send it as `owner_collection`.
    #[serde(default)]
    pub collection: f64,
    #[serde(default)]
    pub curr_reading: f64,
    #[serde(default)]
    pub prev_reading: f64,
    #[serde(default)]
    pub opening_petty: f64,
    #[serde(default)]
    pub closing_petty: f64,
    #[serde(default)]
    pub discrepancy: f64,
}

/// Input shape: rows echoed back from history carry `collection`, the entry
/// form sends `owner_collection`. When both are present the latter wins.
#[derive(Deserialize)]
struct WireEntry {
    date: String,
    #[serde(default)]
    total_sale: f64,
    #[serde(default)]
    cash_sale: f64,
    #[serde(default)]
    card_sale: f64,
    #[serde(default)]
    talabat_sale: f64,
    #[serde(default)]
    insurance_sale: f64,
    #[serde(default)]
    credit_sale: f64,
    #[serde(default)]
    med_purchase: f64,
    #[serde(default)]
    other_exp: f64,
    #[serde(default)]
    collection: f64,
    #[serde(default)]
    owner_collection: Option<f64>,
    #[serde(default)]
    curr_reading: f64,
    #[serde(default)]
    prev_reading: f64,
    #[serde(default)]
    opening_petty: f64,
    #[serde(default)]
    closing_petty: f64,
    #[serde(default)]
    discrepancy: f64,
}

impl From<WireEntry> for LedgerEntryCommand {
    fn from(w: WireEntry) -> Self {
        Self {
            date: w.date,
            total_sale: w.total_sale,
            cash_sale: w.cash_sale,
            card_sale: w.card_sale,
            talabat_sale: w.talabat_sale,
            insurance_sale: w.insurance_sale,
            credit_sale: w.credit_sale,
            med_purchase: w.med_purchase,
            other_exp: w.other_exp,
            collection: w.owner_collection.unwrap_or(w.collection),
            curr_reading: w.curr_reading,
            prev_reading: w.prev_reading,
            opening_petty: w.opening_petty,
            closing_petty: w.closing_petty,
            discrepancy: w.discrepancy,
        }
    }
}

impl LedgerEntryCommand {
    /// An otherwise empty entry carrying only the opening petty cash.
    pub fn opening(date: impl Into<String>, opening_petty: f64) -> Self {
        Self {
            date: date.into(),
            opening_petty,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetupCommand {
    pub password: String,
    pub opening_petty: f64,
}
