use bitflags::bitflags;
use log::trace;

/// Stage of the pipeline, listed in the order they have to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Transmittance,
    MultiScattering,
    SkyView,
    AerialPerspective,
}

impl Stage {
    pub const ALL: [Self; 4] = [
        Self::Transmittance,
        Self::MultiScattering,
        Self::SkyView,
        Self::AerialPerspective,
    ];

    /// Returns flag tracking this stage, or `None` if this stage depends on
    /// per-frame state and so gets recomputed each frame.
    pub fn dirty_flag(self) -> Option<Dirty> {
        match self {
            Self::Transmittance => Some(Dirty::TRANSMITTANCE),
            Self::MultiScattering => Some(Dirty::MULTI_SCATTERING),
            Self::SkyView | Self::AerialPerspective => None,
        }
    }

    /// Returns name under which this stage gets dispatched and logged.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Transmittance => "transmittance",
            Self::MultiScattering => "multi_scattering",
            Self::SkyView => "sky_view",
            Self::AerialPerspective => "aerial_perspective",
        }
    }
}

bitflags! {
    /// Cached stages that have to be recomputed before the next frame.
    #[derive(Default)]
    pub struct Dirty: u8 {
        const TRANSMITTANCE = 1 << 0;
        const MULTI_SCATTERING = 1 << 1;
    }
}

impl Dirty {
    /// Extends these flags with stages depending on the already-flagged ones.
    pub fn with_dependents(self) -> Self {
        if self.contains(Self::TRANSMITTANCE) {
            self | Self::MULTI_SCATTERING
        } else {
            self
        }
    }
}

/// Edit that might invalidate some of the cached stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Change {
    Atmosphere,
    TransmittanceResolution,
    TransmittanceSteps,
    MultiScatteringResolution,
    MultiScatteringSteps,
    GroundAlbedo,
    DirectionSet,
    MultiScatteringEnabled,
    Sun,
    ShadowEnabled,
    SkyViewResolution,
    SkyViewSteps,
    AerialPerspectiveResolution,
    AerialPerspectiveMarching,
    AerialPerspectiveJitter,
    WorldScale,
}

impl Change {
    /// Returns stages invalidated by this change, including the transitive
    /// ones.
    pub fn invalidates(self) -> Dirty {
        let dirty = match self {
            Self::Atmosphere
            | Self::TransmittanceResolution
            | Self::TransmittanceSteps => Dirty::TRANSMITTANCE,

            Self::MultiScatteringResolution
            | Self::MultiScatteringSteps
            | Self::GroundAlbedo
            | Self::DirectionSet => Dirty::MULTI_SCATTERING,

            // Everything else is consumed only by the per-frame stages
            Self::MultiScatteringEnabled
            | Self::Sun
            | Self::ShadowEnabled
            | Self::SkyViewResolution
            | Self::SkyViewSteps
            | Self::AerialPerspectiveResolution
            | Self::AerialPerspectiveMarching
            | Self::AerialPerspectiveJitter
            | Self::WorldScale => Dirty::empty(),
        };

        dirty.with_dependents()
    }
}

/// Keeps track of which stages have to be recomputed.
#[derive(Debug)]
pub struct DirtyGraph {
    dirty: Dirty,
}

impl DirtyGraph {
    /// Creates a graph where everything is dirty, since nothing has been
    /// computed yet.
    pub fn new() -> Self {
        Self { dirty: Dirty::all() }
    }

    pub fn dirty(&self) -> Dirty {
        self.dirty
    }

    pub fn mark(&mut self, change: Change) {
        let dirty = change.invalidates();

        if !dirty.is_empty() {
            trace!("{change:?} invalidated {dirty:?}");
        }

        self.dirty |= dirty;
    }

    pub fn is_dirty(&self, stage: Stage) -> bool {
        stage
            .dirty_flag()
            .map_or(true, |flag| self.dirty.contains(flag))
    }

    /// Returns stages that have to run before the next frame, in the order
    /// they have to run, and clears all flags.
    pub fn resolve_dirty(&mut self) -> Vec<Stage> {
        let schedule: Vec<_> = Stage::ALL
            .into_iter()
            .filter(|stage| self.is_dirty(*stage))
            .collect();

        trace!("Resolved dirty stages: {schedule:?}");

        self.dirty = Dirty::empty();

        schedule
    }

    /// Flags given stages again, e.g. after they've failed to run.
    pub(crate) fn restore(&mut self, dirty: Dirty) {
        self.dirty |= dirty;
    }
}

impl Default for DirtyGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_frame_runs_everything() {
        let mut target = DirtyGraph::new();

        assert_eq!(Stage::ALL.to_vec(), target.resolve_dirty());

        assert_eq!(
            vec![Stage::SkyView, Stage::AerialPerspective],
            target.resolve_dirty()
        );
    }

    #[test]
    fn transmittance_invalidates_multi_scattering() {
        for change in [
            Change::Atmosphere,
            Change::TransmittanceResolution,
            Change::TransmittanceSteps,
        ] {
            let mut target = DirtyGraph::new();

            target.resolve_dirty();
            target.mark(change);

            assert_eq!(Stage::ALL.to_vec(), target.resolve_dirty());
        }
    }

    #[test]
    fn multi_scattering_alone() {
        for change in [
            Change::MultiScatteringResolution,
            Change::MultiScatteringSteps,
            Change::GroundAlbedo,
            Change::DirectionSet,
        ] {
            let mut target = DirtyGraph::new();

            target.resolve_dirty();
            target.mark(change);

            assert!(!target.is_dirty(Stage::Transmittance));

            assert_eq!(
                vec![
                    Stage::MultiScattering,
                    Stage::SkyView,
                    Stage::AerialPerspective
                ],
                target.resolve_dirty()
            );
        }
    }

    #[test]
    fn per_frame_changes() {
        let mut target = DirtyGraph::new();

        target.resolve_dirty();

        for change in [
            Change::Sun,
            Change::ShadowEnabled,
            Change::WorldScale,
            Change::SkyViewResolution,
            Change::AerialPerspectiveResolution,
            Change::MultiScatteringEnabled,
        ] {
            target.mark(change);
        }

        assert_eq!(Dirty::empty(), target.dirty());
        assert!(target.is_dirty(Stage::SkyView));
        assert!(target.is_dirty(Stage::AerialPerspective));
    }

    #[test]
    fn stage_labels() {
        let labels: Vec<_> =
            Stage::ALL.into_iter().map(|stage| stage.label()).collect();

        assert_eq!(
            vec![
                "transmittance",
                "multi_scattering",
                "sky_view",
                "aerial_perspective"
            ],
            labels
        );
    }
}
