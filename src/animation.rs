//! Clip playback control.
//!
//! [`ClipAction`] is the single controllable playback instance of the scene's
//! animation: it owns direction, current time and the paused flag, and it is
//! configured for play-once behaviour that clamps at whichever end the
//! playback direction runs into. The open/close panel actions drive it; the
//! render loop advances it once per frame and applies the sampled transforms
//! to the scene graph.

use cgmath::VectorSpace;
use instant::Duration;

use crate::data_structures::{
    instance::Instance,
    scene_graph::{ModelAnimation, SceneNode},
};

/// Playback state over one animation clip.
///
/// The rest states are fully determined by the rate sign and the clamp:
/// forward playback settles paused at the clip duration (open), backward
/// playback settles paused at zero (closed).
#[derive(Clone, Debug)]
pub struct ClipAction {
    duration: f32,
    time: f32,
    time_scale: f32,
    paused: bool,
}

impl ClipAction {
    /// Build an action over the longest animation track in the scene.
    ///
    /// Returns `None` when nothing in the hierarchy is animated, in which
    /// case no playback controls should be offered.
    pub fn new(root: &dyn SceneNode) -> Option<Self> {
        let duration = max_track_duration(root);
        if duration <= 0.0 {
            return None;
        }
        Some(Self::with_duration(duration))
    }

    /// An action resting in the closed state.
    pub fn with_duration(duration: f32) -> Self {
        Self {
            duration,
            time: 0.0,
            time_scale: 1.0,
            paused: true,
        }
    }

    /// Play the clip forward from the start; settles open.
    ///
    /// Invoking this mid-close restarts from the beginning, matching a
    /// scrub-to-start-then-play control.
    pub fn open(&mut self) {
        self.time_scale = 1.0;
        self.time = 0.0;
        self.paused = false;
    }

    /// Play the clip backward from the end; settles closed.
    ///
    /// Well-defined even when the clip never played: the position is forced
    /// to the end and runs back down to zero.
    pub fn close(&mut self) {
        self.time_scale = -1.0;
        self.paused = false;
        self.time = self.duration;
    }

    /// Advance playback by the frame delta. A no-op while paused.
    pub fn advance(&mut self, dt: Duration) {
        if self.paused {
            return;
        }
        self.time += dt.as_secs_f32() * self.time_scale;
        if self.time >= self.duration {
            self.time = self.duration;
            self.paused = true;
        }
        if self.time <= 0.0 {
            self.time = 0.0;
            self.paused = true;
        }
    }

    /// Sample every animated node at the current time and refresh the world
    /// transforms.
    pub fn apply(&self, root: &mut (dyn SceneNode + '_)) {
        apply_at(root, self.time);
        root.update_world_transforms(&Instance::default());
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }
}

fn max_track_duration(node: &dyn SceneNode) -> f32 {
    let own = node.animation().map(ModelAnimation::duration).unwrap_or(0.0);
    node.get_children()
        .iter()
        .map(|child| max_track_duration(child.as_ref()))
        .fold(own, f32::max)
}

fn apply_at(node: &mut (dyn SceneNode + '_), time: f32) {
    let sampled = node.animation().and_then(|track| sample(track, time));
    if let Some(instance) = sampled {
        node.set_local_transform(instance);
    }
    for child in node.get_children_mut() {
        apply_at(child.as_mut(), time);
    }
}

/// Interpolate a track at `time`, clamped to its endpoints.
pub fn sample(track: &ModelAnimation, time: f32) -> Option<Instance> {
    let len = track.timestamps.len().min(track.instances.len());
    if len == 0 {
        return None;
    }
    if time <= track.timestamps[0] {
        return Some(track.instances[0].clone());
    }
    if time >= track.timestamps[len - 1] {
        return Some(track.instances[len - 1].clone());
    }

    let mut i = 0;
    while i + 1 < len && track.timestamps[i + 1] < time {
        i += 1;
    }
    let t0 = track.timestamps[i];
    let t1 = track.timestamps[i + 1];
    let factor = if t1 > t0 { (time - t0) / (t1 - t0) } else { 0.0 };

    let from = &track.instances[i];
    let to = &track.instances[i + 1];
    Some(Instance {
        position: from.position.lerp(to.position, factor),
        rotation: from.rotation.slerp(to.rotation, factor),
        scale: from.scale.lerp(to.scale, factor),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{One, Quaternion, Vector3};

    fn track() -> ModelAnimation {
        ModelAnimation {
            name: "open".to_string(),
            instances: vec![
                Instance {
                    position: Vector3::new(0.0, 0.0, 0.0),
                    rotation: Quaternion::one(),
                    scale: Vector3::new(1.0, 1.0, 1.0),
                },
                Instance {
                    position: Vector3::new(0.0, 2.0, 0.0),
                    rotation: Quaternion::one(),
                    scale: Vector3::new(1.0, 1.0, 1.0),
                },
            ],
            timestamps: vec![0.0, 2.0],
        }
    }

    #[test]
    fn sampling_clamps_to_the_endpoints() {
        let track = track();
        assert_eq!(sample(&track, -1.0).unwrap().position.y, 0.0);
        assert_eq!(sample(&track, 5.0).unwrap().position.y, 2.0);
    }

    #[test]
    fn sampling_interpolates_between_keys() {
        let track = track();
        let mid = sample(&track, 1.0).unwrap();
        assert!((mid.position.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_tracks_sample_to_nothing() {
        let track = ModelAnimation::default();
        assert!(sample(&track, 0.5).is_none());
    }
}
