//! Pricing-node resolution for (product, size) selections
//!
//! A sub-variant for the exact (product, size) always wins. Otherwise the
//! product's base variant is used, provided the recipe it points at is
//! tagged with the requested size (untagged recipes fit any size).

use super::catalog::CatalogReader;
use super::error::{NotFound, ResolveError};
use super::id::{MaterialId, ProductId, Size};

/// Which binding a selection resolved through
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    SubVariant,
    Variant,
}

/// Returns the composite material to price for a selection
pub fn resolve_pricing_node(
    catalog: &dyn CatalogReader,
    product: &ProductId,
    size: &Size,
) -> Result<(MaterialId, Binding), ResolveError> {
    if let Some(sub) = catalog.sub_variant(product, size)? {
        tracing::debug!(%product, %size, material = %sub.material, "sub-variant override");
        return Ok((sub.material, Binding::SubVariant));
    }

    if let Some(variant) = catalog.variant(product, size)? {
        let tagged_size = catalog
            .composite_material(&variant.material)?
            .and_then(|m| m.size);

        match tagged_size {
            Some(tag) if &tag != size => {
                tracing::debug!(
                    %product,
                    %size,
                    material = %variant.material,
                    tag = %tag,
                    "base recipe is tagged for another size"
                );
            }
            _ => {
                tracing::debug!(%product, %size, material = %variant.material, "base variant");
                return Ok((variant.material, Binding::Variant));
            }
        }
    }

    Err(NotFound::Variant {
        product: product.clone(),
        size: size.clone(),
    }
    .into())
}
