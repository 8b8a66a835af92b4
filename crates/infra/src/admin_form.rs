//! Per-product admin form for the scheduled out-of-stock directive.
//!
//! `render` hands out the current directive plus a fresh security token;
//! `save` verifies the token, sanitizes the date and writes both attributes.
//! A submission with a bad token is dropped without an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use stockdate_core::ProductId;
use stockdate_products::{DateInputPolicy, StockDirective};

use crate::catalog::{CatalogError, ProductCatalog};
use crate::directives::DirectiveRepository;
use crate::form_token::FormTokenStore;
use crate::meta_store::{MetaStore, MetaStoreError};

/// Action the form token is bound to.
pub const SAVE_ACTION: &str = "custom_stock_management_save";

pub const DATE_FIELD: &str = "custom_stock_management_date";
pub const ENABLED_FIELD: &str = "custom_stock_management_auto_out_of_stock";
pub const NONCE_FIELD: &str = "custom_stock_management_nonce";

/// What the form shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveForm {
    pub product_id: ProductId,
    pub target_date: String,
    pub enabled: bool,
    pub nonce: String,
}

/// Raw form fields as submitted (urlencoded).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormSubmission {
    #[serde(rename = "custom_stock_management_date")]
    pub date: Option<String>,
    /// Checkbox: present means checked, the value itself is ignored.
    #[serde(rename = "custom_stock_management_auto_out_of_stock")]
    pub auto_out_of_stock: Option<String>,
    #[serde(rename = "custom_stock_management_nonce")]
    pub nonce: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Both attributes were written.
    Saved(StockDirective),
    /// Token check failed; the stored directive is unchanged.
    Ignored(StockDirective),
}

impl SaveOutcome {
    pub fn directive(&self) -> &StockDirective {
        match self {
            SaveOutcome::Saved(d) | SaveOutcome::Ignored(d) => d,
        }
    }

    pub fn was_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminFormError {
    #[error("product not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Meta(#[from] MetaStoreError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub struct AdminForm<C, M> {
    catalog: C,
    directives: DirectiveRepository<M>,
    tokens: Arc<FormTokenStore>,
    policy: DateInputPolicy,
}

impl<C, M> AdminForm<C, M>
where
    C: ProductCatalog,
    M: MetaStore,
{
    pub fn new(
        catalog: C,
        directives: DirectiveRepository<M>,
        tokens: Arc<FormTokenStore>,
        policy: DateInputPolicy,
    ) -> Self {
        Self {
            catalog,
            directives,
            tokens,
            policy,
        }
    }

    fn ensure_exists(&self, product_id: ProductId) -> Result<(), AdminFormError> {
        match self.catalog.load(product_id)? {
            Some(_) => Ok(()),
            None => Err(AdminFormError::NotFound),
        }
    }

    pub fn read_directive(&self, product_id: ProductId) -> Result<StockDirective, AdminFormError> {
        self.ensure_exists(product_id)?;
        Ok(self.directives.read(product_id)?)
    }

    pub fn render(&self, product_id: ProductId) -> Result<DirectiveForm, AdminFormError> {
        let directive = self.read_directive(product_id)?;
        let nonce = self.tokens.issue(SAVE_ACTION, product_id);

        Ok(DirectiveForm {
            product_id,
            target_date: directive
                .target_date
                .map(|d| d.as_str().to_string())
                .unwrap_or_default(),
            enabled: directive.enabled,
            nonce,
        })
    }

    /// Render the metabox markup.
    pub fn render_html(&self, product_id: ProductId) -> Result<String, AdminFormError> {
        let form = self.render(product_id)?;
        let checked = if form.enabled { " checked='checked'" } else { "" };

        Ok(format!(
            concat!(
                "<input type=\"hidden\" id=\"{nonce_field}\" name=\"{nonce_field}\" value=\"{nonce}\" />",
                "<p>Select the date on which you want this product to be automatically set as ",
                "\"out of stock.\" The product will be automatically updated <b>on</b> this date.</p>",
                "<p><b>Don't forget to check the checkbox</b> or else this option won't work.</p>",
                "<label for=\"{date_field}\">Choose a date:</label>",
                "<input type=\"date\" id=\"{date_field}\" name=\"{date_field}\" value=\"{date}\" /><br />",
                "<label for=\"{enabled_field}\"><input type=\"checkbox\" id=\"{enabled_field}\" ",
                "name=\"{enabled_field}\" value=\"1\"{checked} /> Automatically set as out of stock</label>",
            ),
            nonce_field = NONCE_FIELD,
            nonce = escape_attr(&form.nonce),
            date_field = DATE_FIELD,
            date = escape_attr(&form.target_date),
            enabled_field = ENABLED_FIELD,
            checked = checked,
        ))
    }

    pub fn save(
        &self,
        product_id: ProductId,
        submission: &FormSubmission,
    ) -> Result<SaveOutcome, AdminFormError> {
        self.ensure_exists(product_id)?;

        let check = self
            .tokens
            .verify(submission.nonce.as_deref(), SAVE_ACTION, product_id);
        if !check.is_valid() {
            debug!(product_id = %product_id, check = ?check, "ignoring form save with bad token");
            return Ok(SaveOutcome::Ignored(self.directives.read(product_id)?));
        }

        let target_date = self
            .policy
            .parse_target_date(submission.date.as_deref())
            .map_err(|e| AdminFormError::Validation(e.to_string()))?;
        let directive = StockDirective::new(target_date, submission.auto_out_of_stock.is_some());

        self.directives.write(product_id, &directive)?;
        info!(
            product_id = %product_id,
            target_date = directive.target_date.as_ref().map(|d| d.as_str()).unwrap_or(""),
            enabled = directive.enabled,
            "stock schedule saved"
        );

        Ok(SaveOutcome::Saved(directive))
    }
}

fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryProductCatalog;
    use crate::meta_store::InMemoryMetaStore;
    use stockdate_products::{Product, StockStatus, TargetDate};

    struct Fixture {
        form: AdminForm<Arc<InMemoryProductCatalog>, Arc<InMemoryMetaStore>>,
        product_id: ProductId,
    }

    fn fixture(policy: DateInputPolicy) -> Fixture {
        let catalog = Arc::new(InMemoryProductCatalog::new());
        let product_id = ProductId::new();
        catalog
            .save(&Product::restore(
                product_id,
                "SKU".to_string(),
                "Pumpkin Spice".to_string(),
                StockStatus::InStock,
                1,
            ))
            .unwrap();
        let meta = Arc::new(InMemoryMetaStore::new());
        let form = AdminForm::new(
            catalog,
            DirectiveRepository::new(meta),
            Arc::new(FormTokenStore::default()),
            policy,
        );
        Fixture { form, product_id }
    }

    fn submission(date: Option<&str>, checked: bool, nonce: Option<String>) -> FormSubmission {
        FormSubmission {
            date: date.map(str::to_string),
            auto_out_of_stock: checked.then(|| "1".to_string()),
            nonce,
        }
    }

    #[test]
    fn first_render_shows_defaults() {
        let f = fixture(DateInputPolicy::Permissive);
        let form = f.form.render(f.product_id).unwrap();
        assert_eq!(form.target_date, "");
        assert!(!form.enabled);
        assert!(!form.nonce.is_empty());
    }

    #[test]
    fn save_with_valid_token_writes_directive() {
        let f = fixture(DateInputPolicy::Permissive);
        let nonce = f.form.render(f.product_id).unwrap().nonce;

        let outcome = f
            .form
            .save(f.product_id, &submission(Some("2024-01-01"), true, Some(nonce)))
            .unwrap();

        assert!(outcome.was_saved());
        let stored = f.form.read_directive(f.product_id).unwrap();
        assert_eq!(stored, StockDirective::new(TargetDate::new("2024-01-01"), true));
    }

    #[test]
    fn save_without_valid_token_keeps_previous_values() {
        let f = fixture(DateInputPolicy::Permissive);
        let nonce = f.form.render(f.product_id).unwrap().nonce;
        f.form
            .save(f.product_id, &submission(Some("2024-01-01"), true, Some(nonce.clone())))
            .unwrap();
        let before = f.form.read_directive(f.product_id).unwrap();

        for bad in [None, Some("forged".to_string()), Some(nonce)] {
            let outcome = f
                .form
                .save(f.product_id, &submission(Some("2099-12-31"), false, bad))
                .unwrap();
            assert_eq!(outcome, SaveOutcome::Ignored(before.clone()));
        }

        assert_eq!(f.form.read_directive(f.product_id).unwrap(), before);
    }

    #[test]
    fn unchecked_box_and_missing_date_disable() {
        let f = fixture(DateInputPolicy::Permissive);
        let nonce = f.form.render(f.product_id).unwrap().nonce;
        let outcome = f
            .form
            .save(f.product_id, &submission(None, false, Some(nonce)))
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Saved(StockDirective::default()));
    }

    #[test]
    fn permissive_policy_stores_malformed_text() {
        let f = fixture(DateInputPolicy::Permissive);
        let nonce = f.form.render(f.product_id).unwrap().nonce;
        f.form
            .save(f.product_id, &submission(Some("<i>soon</i>"), true, Some(nonce)))
            .unwrap();
        assert_eq!(
            f.form.read_directive(f.product_id).unwrap().target_date,
            TargetDate::new("soon")
        );
    }

    #[test]
    fn strict_policy_rejects_malformed_text() {
        let f = fixture(DateInputPolicy::Strict);
        let nonce = f.form.render(f.product_id).unwrap().nonce;
        let err = f
            .form
            .save(f.product_id, &submission(Some("soon"), true, Some(nonce)))
            .unwrap_err();
        assert!(matches!(err, AdminFormError::Validation(_)));
        assert_eq!(
            f.form.read_directive(f.product_id).unwrap(),
            StockDirective::default()
        );
    }

    #[test]
    fn unknown_product_is_not_found() {
        let f = fixture(DateInputPolicy::Permissive);
        assert!(matches!(
            f.form.render(ProductId::new()),
            Err(AdminFormError::NotFound)
        ));
    }

    #[test]
    fn html_escapes_stored_text() {
        let f = fixture(DateInputPolicy::Permissive);
        let nonce = f.form.render(f.product_id).unwrap().nonce;
        f.form
            .save(f.product_id, &submission(Some("\"x\" & y"), true, Some(nonce)))
            .unwrap();

        let html = f.form.render_html(f.product_id).unwrap();
        assert!(html.contains("value=\"&quot;x&quot; &amp; y\""));
        assert!(html.contains("checked='checked'"));
        assert!(html.contains(NONCE_FIELD));
    }
}
