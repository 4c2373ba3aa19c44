use crate::config::{HttpSettings, PinSource};
use crate::error::Result;
use crate::upstream::{
    HttpFetcher, PinResolver, RegistryMetadataResolver, TarballLockfileResolver,
};
use std::sync::Arc;

pub struct ResolverFactory;

impl ResolverFactory {
    pub fn create(source: &PinSource, http: &HttpSettings) -> Result<Arc<dyn PinResolver>> {
        let fetcher = HttpFetcher::new(http)?;
        let resolver: Arc<dyn PinResolver> = match source {
            PinSource::TarballLockfile {
                url,
                member_suffix,
                dependency,
            } => Arc::new(TarballLockfileResolver::new(
                fetcher,
                url.as_str(),
                member_suffix.as_str(),
                dependency.as_str(),
            )),
            PinSource::RegistryMetadata {
                url,
                package,
                field,
            } => Arc::new(RegistryMetadataResolver::new(
                fetcher,
                url.as_str(),
                package.as_str(),
                field.as_str(),
            )),
        };
        Ok(resolver)
    }
}
