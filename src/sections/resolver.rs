//! Ordered source acquisition strategies.
//!
//! A named source is first tried as another container of this format, then as an image the
//! raster codec can decode; if both decline, default content is synthesized. Each strategy
//! returns a definite [`Resolution`], so the precedence can be exercised one step at a time.

use std::{path::Path, sync::Arc};

use crate::{
    diagnostics::Diagnostics,
    format::mapfile::MapFile,
    raster::{Raster, Sample},
    sections::{SectionCodec, SectionContext, SectionSource},
};

/// One way of acquiring section content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Copy the section out of another container.
    Container,
    /// Decode an image file.
    Raster,
    /// Generate default content.
    Synthesize,
}

/// Content obtained by a strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Acquired<T> {
    /// A raster still to be normalised and encoded.
    Raster(Raster<T>),
    /// Final section bytes, written as-is.
    Payload(Vec<u8>),
}

/// Outcome of trying one strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// The strategy produced content.
    Acquired(Acquired<T>),
    /// The strategy does not apply, with the reason.
    Declined(String),
}

/// Strategies to try for `source`, in order.
#[must_use]
pub fn strategies(source: &SectionSource) -> &'static [Strategy] {
    match source {
        SectionSource::Synthesize => &[Strategy::Synthesize],
        SectionSource::Path(_) => &[Strategy::Container, Strategy::Raster, Strategy::Synthesize],
    }
}

/// Try a single strategy for section `C`.
pub fn resolve<C: SectionCodec>(
    strategy: Strategy,
    source: &SectionSource,
    context: &SectionContext,
) -> Resolution<C::Sample> {
    match (strategy, source) {
        (Strategy::Synthesize, _) => {
            Resolution::Acquired(Acquired::Raster(C::synthesize(context.dimensions)))
        }
        (_, SectionSource::Synthesize) => Resolution::Declined("no source named".to_string()),
        (Strategy::Container, SectionSource::Path(path)) => from_container::<C>(path, context),
        (Strategy::Raster, SectionSource::Path(path)) => from_image::<C>(path, context),
    }
}

fn from_container<C: SectionCodec>(path: &Path, context: &SectionContext) -> Resolution<C::Sample> {
    if !MapFile::is_map_file(path) {
        return Resolution::Declined("not a map container".to_string());
    }

    // Load-time warnings of a source container belong to that container, not the document
    let map = match MapFile::open(path, context.config, Arc::new(Diagnostics::new())) {
        Ok(map) => map,
        Err(error) => return Resolution::Declined(error.to_string()),
    };

    match C::read_container(&map) {
        Ok(Some(acquired)) => Resolution::Acquired(acquired),
        Ok(None) => Resolution::Declined(format!("container has no {} section", C::KIND)),
        Err(error) => Resolution::Declined(error.to_string()),
    }
}

fn from_image<C: SectionCodec>(path: &Path, context: &SectionContext) -> Resolution<C::Sample> {
    let decoded = context
        .codec
        .decode(path, <C::Sample as Sample>::FORMAT)
        .and_then(<C::Sample as Sample>::from_dyn);

    match decoded {
        Ok(raster) => Resolution::Acquired(Acquired::Raster(raster)),
        Err(error) => Resolution::Declined(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{
        config::MapConfig,
        format::layout::Dimensions,
        raster::{Dxt1Compressor, ImageCodec},
        sections::{SurfaceCodec, TileIndexCodec},
        test::{build_container, temp_path, ContainerSpec},
    };

    fn with_context<R>(f: impl FnOnce(&SectionContext) -> R) -> R {
        let config = MapConfig::default();
        let diagnostics = Diagnostics::new();
        let context = SectionContext {
            dimensions: Dimensions::new(1, 1).unwrap(),
            config: &config,
            codec: &ImageCodec,
            compressor: &Dxt1Compressor,
            diagnostics: &diagnostics,
        };
        f(&context)
    }

    #[test]
    fn strategy_order() {
        assert_eq!(strategies(&SectionSource::Synthesize), &[Strategy::Synthesize]);
        assert_eq!(
            strategies(&SectionSource::Path(PathBuf::from("x"))),
            &[Strategy::Container, Strategy::Raster, Strategy::Synthesize]
        );
    }

    #[test]
    fn container_declines_non_containers() {
        let source = SectionSource::Path(PathBuf::from("/nonexistent/x.png"));
        with_context(|context| {
            assert!(matches!(
                resolve::<SurfaceCodec>(Strategy::Container, &source, context),
                Resolution::Declined(_)
            ));
            assert!(matches!(
                resolve::<SurfaceCodec>(Strategy::Raster, &source, context),
                Resolution::Declined(_)
            ));
        });
    }

    #[test]
    fn container_strategy_reads_section() {
        let path = temp_path("resolver_container_strategy.smf");
        std::fs::write(&path, build_container(&ContainerSpec::new(1, 1))).unwrap();
        let source = SectionSource::Path(path.clone());

        with_context(|context| {
            let Resolution::Acquired(Acquired::Raster(raster)) =
                resolve::<TileIndexCodec>(Strategy::Container, &source, context)
            else {
                panic!("container strategy declined");
            };
            assert_eq!(raster.data()[5], 5);
        });

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn synthesize_always_acquires() {
        with_context(|context| {
            let source = SectionSource::Synthesize;

            let resolution = resolve::<SurfaceCodec>(Strategy::Synthesize, &source, context);
            assert!(matches!(resolution, Resolution::Acquired(Acquired::Raster(_))));

            let resolution = resolve::<SurfaceCodec>(Strategy::Raster, &source, context);
            assert!(matches!(resolution, Resolution::Declined(_)));
        });
    }
}
