use serde::Serialize;

use crate::models::{Product, ProductInput, ProductPatch};

/// Upper bound on `price`
pub const MAX_PRICE: i64 = 9_999_999_999;

/// Length of an ASIN
pub const ASIN_LEN: usize = 10;

/// A field value as seen by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Integer(i64),
}

/// A single rule applied to a present field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Character count within `min..=max`
    Length { min: usize, max: usize },
    /// Character count exactly `n`
    ExactLength(usize),
    /// Integer within `min..=max`
    Range { min: i64, max: i64 },
    /// ASCII letters and digits only
    Alphanumeric,
    /// Absolute URL with a scheme
    Url,
}

impl Rule {
    /// Checks `value` against this rule, returning the violation if any.
    ///
    /// A rule applied to a value of the wrong kind never fires.
    pub fn check(&self, field: &'static str, value: FieldValue<'_>) -> Option<Violation> {
        match (*self, value) {
            (Rule::Length { min, max }, FieldValue::Text(text)) => {
                let len = text.chars().count();
                if len < min {
                    Some(Violation::new(field, "min", Some(min as i64)))
                } else if len > max {
                    Some(Violation::new(field, "max", Some(max as i64)))
                } else {
                    None
                }
            }
            (Rule::ExactLength(n), FieldValue::Text(text)) => (text.chars().count() != n)
                .then(|| Violation::new(field, "len", Some(n as i64))),
            (Rule::Range { min, max }, FieldValue::Integer(number)) => {
                if number < min {
                    Some(Violation::new(field, "min", Some(min)))
                } else if number > max {
                    Some(Violation::new(field, "max", Some(max)))
                } else {
                    None
                }
            }
            (Rule::Alphanumeric, FieldValue::Text(text)) => (!text
                .chars()
                .all(|c| c.is_ascii_alphanumeric()))
            .then(|| Violation::new(field, "alphanum", None)),
            (Rule::Url, FieldValue::Text(text)) => url::Url::parse(text)
                .is_err()
                .then(|| Violation::new(field, "url", None)),
            _ => None,
        }
    }
}

/// Constraints declared for one field
#[derive(Debug, Clone, Copy)]
pub struct FieldConstraint {
    pub field: &'static str,
    pub required: bool,
    pub rules: &'static [Rule],
}

/// The constraints one operation applies to its payload
///
/// [`ConstraintSet::FULL`] backs create and full update, [`ConstraintSet::PARTIAL`]
/// backs partial update.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintSet {
    pub name: &'static str,
    pub fields: &'static [FieldConstraint],
}

const PRODUCT_NAME_RULES: &[Rule] = &[Rule::Length { min: 1, max: 100 }];
const MAKER_NAME_RULES: &[Rule] = &[Rule::Length { min: 1, max: 50 }];
const PRICE_RULES: &[Rule] = &[Rule::Range { min: 1, max: MAX_PRICE }];
const REASON_RULES: &[Rule] = &[Rule::Length { min: 1, max: 100 }];
const URL_RULES: &[Rule] = &[Rule::Url];
const ASIN_RULES: &[Rule] = &[Rule::ExactLength(ASIN_LEN), Rule::Alphanumeric];

impl ConstraintSet {
    /// Create and full update: every field required
    pub const FULL: ConstraintSet = ConstraintSet {
        name: "full",
        fields: &[
            FieldConstraint {
                field: "productName",
                required: true,
                rules: PRODUCT_NAME_RULES,
            },
            FieldConstraint {
                field: "makerName",
                required: true,
                rules: MAKER_NAME_RULES,
            },
            FieldConstraint {
                field: "price",
                required: true,
                rules: PRICE_RULES,
            },
            FieldConstraint {
                field: "reason",
                required: true,
                rules: REASON_RULES,
            },
            FieldConstraint {
                field: "url",
                required: true,
                rules: URL_RULES,
            },
            FieldConstraint {
                field: "asin",
                required: true,
                rules: ASIN_RULES,
            },
        ],
    };

    /// Partial update: every field optional, asin excluded
    pub const PARTIAL: ConstraintSet = ConstraintSet {
        name: "partial",
        fields: &[
            FieldConstraint {
                field: "productName",
                required: false,
                rules: PRODUCT_NAME_RULES,
            },
            FieldConstraint {
                field: "makerName",
                required: false,
                rules: MAKER_NAME_RULES,
            },
            FieldConstraint {
                field: "price",
                required: false,
                rules: PRICE_RULES,
            },
            FieldConstraint {
                field: "reason",
                required: false,
                rules: REASON_RULES,
            },
            FieldConstraint {
                field: "url",
                required: false,
                rules: URL_RULES,
            },
        ],
    };

    /// Checks every constraint and collects all violations
    pub fn check<P: Fields>(&self, payload: &P) -> Result<(), ValidationErrors> {
        let mut violations = Vec::new();

        for constraint in self.fields {
            match payload.field(constraint.field) {
                Some(value) => violations.extend(
                    constraint
                        .rules
                        .iter()
                        .filter_map(|rule| rule.check(constraint.field, value)),
                ),
                None if constraint.required => {
                    violations.push(Violation::new(constraint.field, "required", None));
                }
                None => {}
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            tracing::debug!(
                constraint_set = self.name,
                violation_count = violations.len(),
                "Payload failed validation"
            );
            Err(ValidationErrors(violations))
        }
    }
}

/// Exposes a payload's fields by their JSON name
pub trait Fields {
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

impl Fields for ProductInput {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "productName" => self.product_name.as_deref().map(FieldValue::Text),
            "makerName" => self.maker_name.as_deref().map(FieldValue::Text),
            "price" => self.price.map(FieldValue::Integer),
            "reason" => self.reason.as_deref().map(FieldValue::Text),
            "url" => self.url.as_deref().map(FieldValue::Text),
            "asin" => self.asin.as_deref().map(FieldValue::Text),
            _ => None,
        }
    }
}

impl Fields for ProductPatch {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "productName" => self.product_name.as_deref().map(FieldValue::Text),
            "makerName" => self.maker_name.as_deref().map(FieldValue::Text),
            "price" => self.price.map(FieldValue::Integer),
            "reason" => self.reason.as_deref().map(FieldValue::Text),
            "url" => self.url.as_deref().map(FieldValue::Text),
            _ => None,
        }
    }
}

/// One violated rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub rule: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl Violation {
    pub fn new(field: &'static str, rule: &'static str, limit: Option<i64>) -> Self {
        Self { field, rule, limit }
    }
}

/// Every rule a payload violated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("validation failed: {}", summary(.0))]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<Violation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }
}

impl From<Violation> for ValidationErrors {
    fn from(violation: Violation) -> Self {
        Self(vec![violation])
    }
}

fn summary(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} ({})", v.field, v.rule))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validates a full payload and yields the product it describes
pub fn validate_full(input: ProductInput) -> Result<Product, ValidationErrors> {
    build_product(input, Vec::new())
}

/// Validates a full payload replacing the product stored under `asin`.
///
/// A body asin that differs from `asin` is reported alongside every other violation.
pub fn validate_replacement(input: ProductInput, asin: &str) -> Result<Product, ValidationErrors> {
    let mut extra = Vec::new();
    if input.asin.as_deref().is_some_and(|submitted| submitted != asin) {
        extra.push(Violation::new("asin", "immutable", None));
    }

    build_product(input, extra)
}

fn build_product(input: ProductInput, extra: Vec<Violation>) -> Result<Product, ValidationErrors> {
    let mut violations = match ConstraintSet::FULL.check(&input) {
        Ok(()) => Vec::new(),
        Err(ValidationErrors(found)) => found,
    };
    violations.extend(extra);
    if !violations.is_empty() {
        return Err(ValidationErrors(violations));
    }

    match input {
        ProductInput {
            product_name: Some(product_name),
            maker_name: Some(maker_name),
            price: Some(price),
            reason: Some(reason),
            url: Some(url),
            asin: Some(asin),
        } => Ok(Product {
            product_name,
            maker_name,
            price,
            reason,
            url,
            asin,
        }),
        // FULL marks every field required, so check() has already reported the gap
        _ => Err(Violation::new("payload", "required", None).into()),
    }
}

/// Validates a partial payload. An empty patch is valid.
pub fn validate_partial(patch: &ProductPatch) -> Result<(), ValidationErrors> {
    ConstraintSet::PARTIAL.check(patch)
}
