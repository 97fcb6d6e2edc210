//! Generation-tagged viewer sessions
//!
//! Every load gets a monotonically increasing [`Generation`]. Only the result
//! of the most recently started load may be installed; anything older is
//! discarded when it completes. Each load owns a resource `H` (typically the
//! file bytes) that is dropped as soon as the load is superseded, fails, or
//! its view is replaced.

use crate::color::ColorMode;
use crate::config::ViewerConfig;
use crate::metadata::{EmptyPointSet, Metadata};
use crate::pipeline::{Pipeline, RenderBundle};
use pointview_core::{Error, ErrorSignal, Result};
use pointview_io::{RawCoordinates, SourceFile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{error, info, warn};

/// Identifies one requested load; later loads have larger generations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    pub fn get(&self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handed out by [`ViewerSession::begin_load`] and consumed by
/// [`ViewerSession::complete`], so each load completes at most once
#[derive(Debug, PartialEq, Eq)]
pub struct LoadTicket {
    generation: Generation,
}

impl LoadTicket {
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// Outcome of a load, delivered to the UI instead of a broadcast event
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// The load's bundle is now the installed view
    Installed {
        generation: Generation,
        metadata: Metadata,
    },
    /// Installed, but with zero usable points
    Empty {
        generation: Generation,
        metadata: Metadata,
        empty: EmptyPointSet,
    },
    /// A newer load was started (or the session cleared) before this one
    /// finished; nothing was installed
    Discarded {
        generation: Generation,
        latest: Generation,
    },
    /// Decoding or processing failed; the previous view is untouched
    Failed {
        generation: Generation,
        signal: ErrorSignal,
    },
    /// Rejected before a load was started (e.g. unsupported format)
    Rejected { signal: ErrorSignal },
}

impl LoadEvent {
    /// Metadata to display, if this event installed a view
    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            LoadEvent::Installed { metadata, .. } | LoadEvent::Empty { metadata, .. } => {
                Some(metadata)
            }
            _ => None,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.metadata().is_some()
    }
}

/// A completed load and the resource it was decoded from
#[derive(Debug)]
pub struct InstalledView<H> {
    pub generation: Generation,
    pub bundle: RenderBundle,
    pub resource: H,
}

/// Owns the currently displayed point cloud and arbitrates between loads
pub struct ViewerSession<H> {
    pipeline: Pipeline,
    latest: Generation,
    pending: Option<(Generation, H)>,
    installed: Option<InstalledView<H>>,
}

impl<H> ViewerSession<H> {
    pub fn new(config: ViewerConfig) -> Result<Self> {
        Ok(Self {
            pipeline: Pipeline::new(config)?,
            latest: Generation::default(),
            pending: None,
            installed: None,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        self.pipeline.config()
    }

    /// Generation of the most recently started load
    pub fn latest_generation(&self) -> Generation {
        self.latest
    }

    /// Start a new load that owns `resource`
    ///
    /// Any load still pending is superseded: its resource is released now
    /// and its eventual result will be discarded.
    pub fn begin_load(&mut self, resource: H) -> LoadTicket {
        self.latest = self.latest.next();
        if let Some((superseded, _)) = self.pending.replace((self.latest, resource)) {
            info!(%superseded, latest = %self.latest, "released resource of superseded load");
        }
        info!(generation = %self.latest, "load started");
        LoadTicket {
            generation: self.latest,
        }
    }

    /// The resource of a load that has not completed yet
    pub fn pending_resource(&self, ticket: &LoadTicket) -> Option<&H> {
        match &self.pending {
            Some((generation, resource)) if *generation == ticket.generation => Some(resource),
            _ => None,
        }
    }

    /// Finish a load with the loader's result
    ///
    /// Results for anything but the latest generation are discarded without
    /// running the pipeline.
    pub fn complete(&mut self, ticket: LoadTicket, decoded: Result<RawCoordinates>) -> LoadEvent {
        let generation = ticket.generation;
        let resource = match self.pending.take() {
            Some((pending, resource)) if pending == generation && generation == self.latest => {
                resource
            }
            other => {
                self.pending = other;
                info!(%generation, latest = %self.latest, "discarded result of superseded load");
                return LoadEvent::Discarded {
                    generation,
                    latest: self.latest,
                };
            }
        };

        let raw = match decoded {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%generation, error = %err, "failed to decode point cloud");
                return LoadEvent::Failed {
                    generation,
                    signal: ErrorSignal::from(err),
                };
            }
        };

        match self.pipeline.run(&raw) {
            Ok(bundle) => self.install(generation, bundle, resource),
            Err(err) => {
                if err.is_contract_violation() {
                    error!(%generation, error = %err, "aborted render");
                } else {
                    warn!(%generation, error = %err, "failed to process point cloud");
                }
                LoadEvent::Failed {
                    generation,
                    signal: ErrorSignal::from(err),
                }
            }
        }
    }

    fn install(&mut self, generation: Generation, bundle: RenderBundle, resource: H) -> LoadEvent {
        let metadata = bundle.metadata.clone();
        let empty = bundle.empty;
        let view = InstalledView {
            generation,
            bundle,
            resource,
        };
        if let Some(previous) = self.installed.replace(view) {
            info!(generation = %previous.generation, "released superseded view");
        }

        info!(
            %generation,
            points = metadata.point_count,
            dimensions = %metadata.bounding_box_label,
            "load installed"
        );
        match empty {
            Some(empty) => LoadEvent::Empty {
                generation,
                metadata,
                empty,
            },
            None => LoadEvent::Installed {
                generation,
                metadata,
            },
        }
    }

    /// The installed view, if any
    pub fn view(&self) -> Option<&InstalledView<H>> {
        self.installed.as_ref()
    }

    /// The installed bundle, if any
    pub fn bundle(&self) -> Option<&RenderBundle> {
        self.installed.as_ref().map(|v| &v.bundle)
    }

    /// Switch colour mode, recolouring the installed view in place
    pub fn set_color_mode(&mut self, mode: ColorMode) -> Result<()> {
        self.pipeline = Pipeline::new(self.pipeline.config().clone().with_color_mode(mode))?;
        if let Some(view) = self.installed.as_mut() {
            if let Err(err) = view.bundle.recolor(mode) {
                error!(generation = %view.generation, error = %err, "aborted recolor");
                self.installed = None;
                return Err(err);
            }
        }
        info!(%mode, "changed color mode");
        Ok(())
    }

    /// Change the point size passed to the render surface
    pub fn set_point_size(&mut self, point_size: f32) -> Result<()> {
        self.pipeline = Pipeline::new(self.pipeline.config().clone().with_point_size(point_size))?;
        if let Some(view) = self.installed.as_mut() {
            view.bundle.point_size = point_size;
        }
        info!(point_size, "changed point size");
        Ok(())
    }

    /// Release the installed view and any pending load
    ///
    /// A load that was pending will be discarded when it completes.
    pub fn clear(&mut self) {
        if let Some((generation, _)) = self.pending.take() {
            info!(%generation, "released resource of cancelled load");
        }
        if let Some(view) = self.installed.take() {
            info!(generation = %view.generation, "released view");
        }
    }
}

impl ViewerSession<SourceFile> {
    /// Decode and install an in-memory file in one step
    pub fn load(&mut self, file: SourceFile) -> LoadEvent {
        info!(
            file = %file.summary().name,
            format = %file.format(),
            size = %file.summary().size_label(),
            "loading point cloud file"
        );
        let ticket = self.begin_load(file);
        let decoded = match self.pending_resource(&ticket) {
            Some(file) => file.decode(),
            None => Err(Error::ContractViolation(
                "pending load vanished before decoding".to_string(),
            )),
        };
        self.complete(ticket, decoded)
    }

    /// Read, decode and install a file from disk
    ///
    /// An unsupported extension or unreadable file is rejected before a
    /// load starts, leaving the current view and generation alone.
    pub fn load_path<P: AsRef<Path>>(&mut self, path: P) -> LoadEvent {
        match SourceFile::open(path.as_ref()) {
            Ok(file) => self.load(file),
            Err(err) => {
                warn!(path = %path.as_ref().display(), error = %err, "rejected file");
                LoadEvent::Rejected {
                    signal: ErrorSignal::from(err),
                }
            }
        }
    }
}

impl<H> Drop for ViewerSession<H> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointview_core::ErrorKind;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Resource that counts how many times it has been released
    struct Tracked {
        id: u32,
        released: Rc<Cell<usize>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.released.set(self.released.get() + 1);
        }
    }

    fn session() -> (ViewerSession<Tracked>, Rc<Cell<usize>>) {
        (
            ViewerSession::new(ViewerConfig::default()).unwrap(),
            Rc::new(Cell::new(0)),
        )
    }

    fn tracked(id: u32, released: &Rc<Cell<usize>>) -> Tracked {
        Tracked {
            id,
            released: Rc::clone(released),
        }
    }

    #[test]
    fn test_generations_increase() {
        let (mut session, released) = session();
        let a = session.begin_load(tracked(1, &released));
        let b = session.begin_load(tracked(2, &released));
        assert!(b.generation() > a.generation());
        assert_eq!(session.latest_generation(), b.generation());
    }

    #[test]
    fn test_superseded_load_is_discarded() {
        let (mut session, released) = session();
        let first = session.begin_load(tracked(1, &released));
        let second = session.begin_load(tracked(2, &released));
        // Starting the second load released the first one's resource
        assert_eq!(released.get(), 1);

        let event = session.complete(first, Ok(vec![9.0, 9.0, 9.0]));
        assert!(matches!(event, LoadEvent::Discarded { .. }));
        assert!(session.view().is_none());

        let event = session.complete(second, Ok(vec![0.0, 0.0, 0.0, 1.0, 1.0, 2.0]));
        assert!(event.is_installed());
        let view = session.view().unwrap();
        assert_eq!(view.resource.id, 2);
        assert_eq!(view.bundle.metadata.bounding_box_label, "1.00×1.00×2.00");
    }

    #[test]
    fn test_out_of_order_completion_keeps_latest() {
        let (mut session, released) = session();
        let first = session.begin_load(tracked(1, &released));
        let second = session.begin_load(tracked(2, &released));

        assert!(session.complete(second, Ok(vec![1.0, 2.0, 3.0])).is_installed());
        let event = session.complete(first, Ok(vec![4.0, 5.0, 6.0, 7.0, 8.0, 9.0]));
        assert!(matches!(
            event,
            LoadEvent::Discarded { latest, .. } if latest == session.latest_generation()
        ));
        assert_eq!(session.bundle().unwrap().metadata.point_count, 1);
    }

    #[test]
    fn test_install_releases_previous_view() {
        let (mut session, released) = session();
        let ticket = session.begin_load(tracked(1, &released));
        session.complete(ticket, Ok(vec![0.0, 0.0, 0.0]));
        assert_eq!(released.get(), 0);

        let ticket = session.begin_load(tracked(2, &released));
        session.complete(ticket, Ok(vec![1.0, 1.0, 1.0]));
        assert_eq!(released.get(), 1);
        assert_eq!(session.view().unwrap().resource.id, 2);
    }

    #[test]
    fn test_decode_failure_keeps_previous_view() {
        let (mut session, released) = session();
        let ticket = session.begin_load(tracked(1, &released));
        session.complete(ticket, Ok(vec![0.0, 0.0, 0.0]));

        let ticket = session.begin_load(tracked(2, &released));
        let event = session.complete(ticket, Err(Error::Decode("bad header".into())));
        match event {
            LoadEvent::Failed { signal, .. } => assert_eq!(signal.kind, ErrorKind::DecodeFailure),
            other => panic!("expected failure, got {other:?}"),
        }
        // The failed load's resource is gone, the old view is still there
        assert_eq!(released.get(), 1);
        assert_eq!(session.view().unwrap().resource.id, 1);
    }

    #[test]
    fn test_contract_violation_aborts_render() {
        let (mut session, released) = session();
        let ticket = session.begin_load(tracked(1, &released));
        let event = session.complete(ticket, Ok(vec![1.0, 2.0, 3.0, 4.0]));
        match event {
            LoadEvent::Failed { signal, .. } => {
                assert_eq!(signal.kind, ErrorKind::ContractViolation)
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(session.view().is_none());
    }

    #[test]
    fn test_empty_load_event() {
        let (mut session, released) = session();
        let ticket = session.begin_load(tracked(1, &released));
        let event = session.complete(ticket, Ok(vec![f64::NAN, 0.0, 0.0]));
        match event {
            LoadEvent::Empty { metadata, empty, .. } => {
                assert_eq!(metadata.point_count, 0);
                assert_eq!(metadata.bounding_box_label, "0.00×0.00×0.00");
                assert_eq!(empty.source_rows, 1);
            }
            other => panic!("expected empty, got {other:?}"),
        }
    }

    #[test]
    fn test_set_color_mode_recolors_installed_view() {
        let (mut session, released) = session();
        let ticket = session.begin_load(tracked(1, &released));
        session.complete(ticket, Ok(vec![0.0, 0.0, 0.0, 1.0, 1.0, 2.0]));

        session.set_color_mode(ColorMode::Uniform).unwrap();
        let bundle = session.bundle().unwrap();
        assert_eq!(bundle.color_mode, ColorMode::Uniform);
        assert!(bundle.colors.iter().all(|c| *c == pointview_core::Rgb::WHITE));
        assert_eq!(session.config().color_mode, ColorMode::Uniform);
    }

    #[test]
    fn test_set_point_size() {
        let (mut session, released) = session();
        let ticket = session.begin_load(tracked(1, &released));
        session.complete(ticket, Ok(vec![0.0, 0.0, 0.0]));

        session.set_point_size(0.005).unwrap();
        assert_eq!(session.bundle().unwrap().point_size, 0.005);
        assert!(session.set_point_size(0.0).is_err());
        assert_eq!(session.config().point_size, 0.005);
    }

    #[test]
    fn test_clear_cancels_pending_and_releases_view() {
        let (mut session, released) = session();
        let ticket = session.begin_load(tracked(1, &released));
        session.complete(ticket, Ok(vec![0.0, 0.0, 0.0]));
        let pending = session.begin_load(tracked(2, &released));

        session.clear();
        assert_eq!(released.get(), 2);
        assert!(session.view().is_none());
        assert!(matches!(
            session.complete(pending, Ok(vec![1.0, 1.0, 1.0])),
            LoadEvent::Discarded { .. }
        ));
    }

    #[test]
    fn test_drop_releases_everything() {
        let released = Rc::new(Cell::new(0));
        {
            let mut session = ViewerSession::new(ViewerConfig::default()).unwrap();
            let ticket = session.begin_load(tracked(1, &released));
            session.complete(ticket, Ok(vec![0.0, 0.0, 0.0]));
            let _pending = session.begin_load(tracked(2, &released));
        }
        assert_eq!(released.get(), 2);
    }

    #[test]
    fn test_load_source_file() {
        let mut session = ViewerSession::new(ViewerConfig::default()).unwrap();
        let file = SourceFile::from_bytes("scan.xyz", b"0 0 0\n1 1 2\nnan 0 0\n".to_vec()).unwrap();
        let event = session.load(file);
        assert_eq!(event.metadata().unwrap().point_count, 2);
        assert_eq!(session.view().unwrap().resource.summary().name, "scan.xyz");
    }

    #[test]
    fn test_load_path_rejects_unsupported_format() {
        let mut session = ViewerSession::new(ViewerConfig::default()).unwrap();
        let before = session.latest_generation();
        match session.load_path("roads.geojson") {
            LoadEvent::Rejected { signal } => assert_eq!(signal.kind, ErrorKind::UnsupportedFormat),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(session.latest_generation(), before);
    }
}
