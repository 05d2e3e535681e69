//! Translator façade: whole-template resolution with no partial results.

use crate::context::{TranslateContext, TranslationResult};
use crate::error::Error;
use crate::template::PathTemplate;

/// Resolves a selected candidate template against one request.
///
/// `Ok(None)` is the normal "try the next endpoint" outcome. Implementations
/// are shared across requests and must not keep per-request state.
pub trait ODataTemplateTranslator: Send + Sync {
    /// # Errors
    /// Client errors detected after the template matched by shape.
    fn translate(
        &self,
        template: &PathTemplate,
        ctx: TranslateContext<'_>,
    ) -> Result<Option<TranslationResult>, Error>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultODataTemplateTranslator;

impl ODataTemplateTranslator for DefaultODataTemplateTranslator {
    fn translate(
        &self,
        template: &PathTemplate,
        mut ctx: TranslateContext<'_>,
    ) -> Result<Option<TranslationResult>, Error> {
        if !template.translate(&mut ctx)? {
            return Ok(None);
        }
        let result = ctx.into_result();
        tracing::trace!(
            template = %template,
            path = %result.path,
            "Translated OData path template"
        );
        Ok(Some(result))
    }
}
