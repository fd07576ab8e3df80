//! Value objects for the order domain.

use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 2500 = R$ 25.00)
    cents: i64,
}

impl Money {
    /// Largest amount accepted on a line or an order (R$ 100 million).
    pub const MAX: Money = Money {
        cents: 10_000_000_000,
    };

    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a Money amount from a decimal value, rounding to the nearest cent.
    ///
    /// Returns None for NaN, infinities and magnitudes above [`Money::MAX`].
    pub fn from_decimal(amount: f64) -> Option<Self> {
        let cents = (amount * 100.0).round();
        if !cents.is_finite() || cents.abs() > Self::MAX.cents as f64 {
            return None;
        }
        Some(Self {
            cents: cents as i64,
        })
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the amount as a decimal value (for display and wire formats only).
    pub fn to_decimal(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    /// Returns the whole-currency portion.
    pub fn units(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after whole units).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity, saturating at the `i64` bounds.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents.saturating_mul(i64::from(quantity)),
        }
    }

    /// Multiplies by a quantity, returning None on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts, returning None on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }

    /// Returns `percent`% of this amount, rounded to the nearest cent.
    pub fn percent(&self, percent: f64) -> Money {
        Money {
            cents: (self.cents as f64 * percent / 100.0).round() as i64,
        }
    }

    /// Clamps negative amounts to zero.
    pub fn non_negative(self) -> Money {
        Money {
            cents: self.cents.max(0),
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-R$ {}.{:02}", self.units().abs(), self.cents_part())
        } else {
            write!(f, "R$ {}.{:02}", self.units(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_sub(rhs.cents),
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents = self.cents.saturating_add(rhs.cents);
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Short human-readable ticket code: one letter followed by three digits (e.g. `A123`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderCode(String);

impl OrderCode {
    /// Builds a code from a prefix letter and a number in `100..=999`.
    pub fn new(prefix: char, number: u16) -> Self {
        Self(format!("{}{:03}", prefix.to_ascii_uppercase(), number))
    }

    /// Parses a code typed by a customer or operator, normalising case.
    ///
    /// Returns None unless the input is a single ASCII letter followed by
    /// exactly three digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut chars = raw.chars();
        let letter = chars.next()?;
        let digits: Vec<char> = chars.collect();
        if !letter.is_ascii_alphabetic()
            || digits.len() != 3
            || !digits.iter().all(|c| c.is_ascii_digit())
        {
            return None;
        }
        Some(Self(raw.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the order is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    /// Table service.
    Mesa,
    /// Counter pickup.
    Balcao,
    /// Courier delivery.
    Delivery,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Mesa => "MESA",
            ServiceType::Balcao => "BALCAO",
            ServiceType::Delivery => "DELIVERY",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MESA" => Ok(ServiceType::Mesa),
            "BALCAO" => Ok(ServiceType::Balcao),
            "DELIVERY" => Ok(ServiceType::Delivery),
            other => Err(format!("unknown service type: {other}")),
        }
    }
}

/// Payment method tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingType {
    Pix,
    CreditCard,
    /// Card terminal operated by staff.
    Maquininha,
    /// Cash.
    Dinheiro,
}

impl BillingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingType::Pix => "PIX",
            BillingType::CreditCard => "CREDIT_CARD",
            BillingType::Maquininha => "MAQUININHA",
            BillingType::Dinheiro => "DINHEIRO",
        }
    }

    /// Returns true if the billing provider issues a charge for this method.
    ///
    /// Card terminal and cash payments are settled in person.
    pub fn is_provider_charged(&self) -> bool {
        matches!(self, BillingType::Pix | BillingType::CreditCard)
    }
}

impl std::fmt::Display for BillingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Staff member performing an action (delivery signature, overrides).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Returns true if both id and name carry a non-blank value.
    pub fn is_identified(&self) -> bool {
        !self.id.trim().is_empty() && !self.name.trim().is_empty()
    }
}

/// Courier assigned to a delivery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Courier {
    pub name: String,
    pub phone: String,
}

impl Courier {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }

    /// Returns the courier with trimmed fields, or None if either is blank.
    pub fn normalized(&self) -> Option<Courier> {
        let name = self.name.trim();
        let phone = self.phone.trim();
        if name.is_empty() || phone.is_empty() {
            return None;
        }
        Some(Courier::new(name, phone))
    }
}

/// Payer details forwarded to the billing provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Tax document (CPF/CNPJ) when the provider requires one.
    #[serde(default)]
    pub document: Option<String>,
}

/// Reference to a charge issued by the billing provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeReference {
    pub charge_id: String,
    #[serde(default)]
    pub invoice_url: Option<String>,
    /// PIX copy-paste payload.
    #[serde(default)]
    pub qr_payload: Option<String>,
    /// Base64 QR image.
    #[serde(default)]
    pub qr_image: Option<String>,
}

/// A line of an order: a snapshot of the product at order time.
///
/// Never a live reference to the catalog, so later catalog edits cannot
/// change what a placed order costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product name as it was when the order was placed.
    pub product_name: String,

    /// Quantity ordered.
    pub quantity: u32,

    /// Free-text notes (e.g. "sem cebola").
    #[serde(default)]
    pub notes: Option<String>,

    /// Unit price at order time.
    #[serde(default)]
    pub price: Option<Money>,

    /// Precomputed line total; authoritative over `price * quantity` when present.
    #[serde(default)]
    pub total_price: Option<Money>,
}

impl OrderItem {
    /// Creates an item priced per unit.
    pub fn new(product_name: impl Into<String>, quantity: u32, price: Money) -> Self {
        Self {
            product_name: product_name.into(),
            quantity,
            notes: None,
            price: Some(price),
            total_price: None,
        }
    }

    /// Attaches notes to the item.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets a precomputed line total.
    pub fn with_total_price(mut self, total: Money) -> Self {
        self.total_price = Some(total);
        self
    }
}
