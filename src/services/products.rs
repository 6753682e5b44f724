use crate::{
    db::ProductRepository,
    error::{AppError, AppResult},
    models::{Product, ProductInput, ProductPatch, ProductRecord},
    validation,
};

/// Looks up the row for `asin` in the wanted state, treating a wrong-state row as absent
async fn find_in_state(
    repo: &dyn ProductRepository,
    asin: &str,
    active: bool,
) -> AppResult<ProductRecord> {
    repo.find(asin, active)
        .await?
        .ok_or_else(|| AppError::NotFound(asin.to_string()))
}

/// Creates a new active product
pub async fn create_product(
    repo: &dyn ProductRepository,
    input: ProductInput,
) -> AppResult<Product> {
    if let Some(asin) = input.asin.as_deref() {
        if repo.find(asin, true).await?.is_some() {
            tracing::info!(asin = %asin, "Rejected create for existing active asin");
            return Err(AppError::Conflict(asin.to_string()));
        }
    }

    let product = validation::validate_full(input)?;

    // The unique index still guards a concurrent create that slipped past the check above
    let record = repo.insert(&product).await?;

    tracing::info!(asin = %record.asin, id = record.id, "Product created");

    Ok(record.into())
}

/// Returns the active product for `asin`
pub async fn get_product(repo: &dyn ProductRepository, asin: &str) -> AppResult<Product> {
    find_in_state(repo, asin, true).await.map(Product::from)
}

/// Overwrites every business field of the active product and echoes the submitted payload
///
/// `input` is the decoded request body or its decoding failure; either way an
/// unknown asin is reported first.
pub async fn replace_product(
    repo: &dyn ProductRepository,
    asin: &str,
    input: AppResult<ProductInput>,
) -> AppResult<Product> {
    find_in_state(repo, asin, true).await?;

    let product = validation::validate_replacement(input?, asin)?;

    repo.replace(asin, &product)
        .await?
        .ok_or_else(|| AppError::NotFound(asin.to_string()))?;

    tracing::info!(asin = %asin, "Product replaced");

    Ok(product)
}

/// Writes the fields present in `patch` and returns the product as stored afterwards
///
/// As with [`replace_product`], a body decoding failure only surfaces once the row is known.
pub async fn patch_product(
    repo: &dyn ProductRepository,
    asin: &str,
    patch: AppResult<ProductPatch>,
) -> AppResult<Product> {
    find_in_state(repo, asin, true).await?;

    let patch = patch?;
    validation::validate_partial(&patch)?;

    let record = repo
        .patch(asin, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound(asin.to_string()))?;

    tracing::info!(asin = %asin, empty = patch.is_empty(), "Product patched");

    Ok(record.into())
}

/// Soft-deletes the active product for `asin`
pub async fn delete_product(repo: &dyn ProductRepository, asin: &str) -> AppResult<()> {
    let record = find_in_state(repo, asin, true).await?;

    if !repo.set_status(&record, false).await? {
        return Err(AppError::NotFound(asin.to_string()));
    }

    tracing::info!(asin = %asin, id = record.id, "Product deleted");

    Ok(())
}

/// Restores the inactive product for `asin`, returning its fields as read before the flip
pub async fn undelete_product(repo: &dyn ProductRepository, asin: &str) -> AppResult<Product> {
    let record = find_in_state(repo, asin, false).await?;

    if !repo.set_status(&record, true).await? {
        return Err(AppError::NotFound(asin.to_string()));
    }

    tracing::info!(asin = %asin, id = record.id, "Product restored");

    Ok(record.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockProductRepository;
    use crate::validation::Violation;
    use chrono::Utc;
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    fn product() -> Product {
        Product {
            product_name: "Widget".to_string(),
            maker_name: "Acme".to_string(),
            price: 999,
            reason: "gift".to_string(),
            url: "http://x.com/w".to_string(),
            asin: "AB12345678".to_string(),
        }
    }

    fn record(status: bool) -> ProductRecord {
        let p = product();
        let now = Utc::now();
        ProductRecord {
            id: 7,
            product_name: p.product_name,
            maker_name: p.maker_name,
            price: p.price,
            reason: p.reason,
            url: p.url,
            asin: p.asin,
            created_at: now,
            updated_at: now,
            status,
        }
    }

    fn undecodable<T>() -> AppResult<T> {
        Err(AppError::InvalidInput("Failed to parse the request body".to_string()))
    }

    #[tokio::test]
    async fn test_create_inserts_valid_product() {
        let mut repo = MockProductRepository::new();
        repo.expect_find()
            .with(eq("AB12345678"), eq(true))
            .times(1)
            .returning(|_, _| Ok(None));
        repo.expect_insert()
            .withf(|p| p.asin == "AB12345678")
            .times(1)
            .returning(|_| Ok(record(true)));

        let created = assert_ok!(create_product(&repo, product().into()).await);
        assert_eq!(created, product());
    }

    #[tokio::test]
    async fn test_create_rejects_existing_active_asin() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().returning(|_, _| Ok(Some(record(true))));
        repo.expect_insert().never();

        let err = assert_err!(create_product(&repo, product().into()).await);
        assert!(matches!(err, AppError::Conflict(asin) if asin == "AB12345678"));
    }

    #[tokio::test]
    async fn test_create_validates_before_any_write() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().returning(|_, _| Ok(None));
        repo.expect_insert().never();

        let input = ProductInput {
            price: Some(0),
            ..product().into()
        };

        let err = assert_err!(create_product(&repo, input).await);
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_without_asin_skips_lookup() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().never();
        repo.expect_insert().never();

        let input = ProductInput {
            asin: None,
            ..product().into()
        };

        let err = assert_err!(create_product(&repo, input).await);
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.violations(), &[Violation::new("asin", "required", None)]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_inactive_is_not_found() {
        let mut repo = MockProductRepository::new();
        repo.expect_find()
            .with(eq("AB12345678"), eq(true))
            .returning(|_, _| Ok(None));

        let err = assert_err!(get_product(&repo, "AB12345678").await);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_replace_returns_submitted_payload() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().returning(|_, _| Ok(Some(record(true))));
        repo.expect_replace()
            .withf(|asin, p| asin == "AB12345678" && p.price == 2000)
            .times(1)
            .returning(|_, _| Ok(Some(record(true))));

        let submitted = Product {
            price: 2000,
            ..product()
        };

        let returned =
            assert_ok!(replace_product(&repo, "AB12345678", Ok(submitted.clone().into())).await);
        assert_eq!(returned, submitted);
    }

    #[tokio::test]
    async fn test_replace_checks_existence_before_validation() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().returning(|_, _| Ok(None));
        repo.expect_replace().never();

        let err =
            assert_err!(replace_product(&repo, "AB12345678", Ok(ProductInput::default())).await);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_replace_rejects_asin_change() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().returning(|_, _| Ok(Some(record(true))));
        repo.expect_replace().never();

        let input = ProductInput {
            asin: Some("ZZ99999999".to_string()),
            ..product().into()
        };

        let err = assert_err!(replace_product(&repo, "AB12345678", Ok(input)).await);
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.violations(), &[Violation::new("asin", "immutable", None)]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_replace_reports_asin_change_with_other_violations() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().returning(|_, _| Ok(Some(record(true))));
        repo.expect_replace().never();

        let input = ProductInput {
            price: Some(0),
            asin: Some("ZZ99999999".to_string()),
            ..product().into()
        };

        let err = assert_err!(replace_product(&repo, "AB12345678", Ok(input)).await);
        match err {
            AppError::Validation(errors) => {
                let rules: Vec<_> = errors.violations().iter().map(|v| (v.field, v.rule)).collect();
                assert_eq!(rules, vec![("price", "min"), ("asin", "immutable")]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undecodable_body_on_unknown_asin_is_not_found() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().times(2).returning(|_, _| Ok(None));
        repo.expect_replace().never();
        repo.expect_patch().never();

        let err = assert_err!(replace_product(&repo, "NOPE000000", undecodable()).await);
        assert!(matches!(err, AppError::NotFound(_)));

        let err = assert_err!(patch_product(&repo, "NOPE000000", undecodable()).await);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_undecodable_body_on_active_asin_is_invalid_input() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().returning(|_, _| Ok(Some(record(true))));
        repo.expect_replace().never();

        let err = assert_err!(replace_product(&repo, "AB12345678", undecodable()).await);
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_patch_returns_stored_row() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().returning(|_, _| Ok(Some(record(true))));
        repo.expect_patch().times(1).returning(|_, _| {
            let mut stored = record(true);
            stored.reason = "birthday".to_string();
            Ok(Some(stored))
        });

        let patch = ProductPatch {
            reason: Some("birthday".to_string()),
            ..Default::default()
        };

        let updated = assert_ok!(patch_product(&repo, "AB12345678", Ok(patch)).await);
        assert_eq!(updated.reason, "birthday");
        assert_eq!(updated.product_name, "Widget");
    }

    #[tokio::test]
    async fn test_patch_rejects_invalid_present_field() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().returning(|_, _| Ok(Some(record(true))));
        repo.expect_patch().never();

        let patch = ProductPatch {
            url: Some("not a url".to_string()),
            ..Default::default()
        };

        let err = assert_err!(patch_product(&repo, "AB12345678", Ok(patch)).await);
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_flips_active_row() {
        let mut repo = MockProductRepository::new();
        repo.expect_find()
            .with(eq("AB12345678"), eq(true))
            .returning(|_, _| Ok(Some(record(true))));
        repo.expect_set_status()
            .withf(|r, active| r.id == 7 && !*active)
            .times(1)
            .returning(|_, _| Ok(true));

        assert_ok!(delete_product(&repo, "AB12345678").await);
    }

    #[tokio::test]
    async fn test_delete_lost_race_is_not_found() {
        let mut repo = MockProductRepository::new();
        repo.expect_find().returning(|_, _| Ok(Some(record(true))));
        repo.expect_set_status().returning(|_, _| Ok(false));

        let err = assert_err!(delete_product(&repo, "AB12345678").await);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_undelete_requires_inactive_row() {
        let mut repo = MockProductRepository::new();
        repo.expect_find()
            .with(eq("AB12345678"), eq(false))
            .returning(|_, _| Ok(None));
        repo.expect_set_status().never();

        let err = assert_err!(undelete_product(&repo, "AB12345678").await);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_undelete_returns_pre_transition_fields() {
        let mut repo = MockProductRepository::new();
        repo.expect_find()
            .with(eq("AB12345678"), eq(false))
            .returning(|_, _| Ok(Some(record(false))));
        repo.expect_set_status()
            .withf(|r, active| r.id == 7 && *active)
            .returning(|_, _| Ok(true));

        let restored = assert_ok!(undelete_product(&repo, "AB12345678").await);
        assert_eq!(restored, product());
    }
}
