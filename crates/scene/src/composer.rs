//! Scene composition: wires entities, cameras, environment and overlays
//! into the two runnable scenes.

use crate::butterfly::Butterfly;
use crate::camera::{Camera, LerpCamera};
use crate::city::CityModel;
use crate::clock::FrameTick;
use crate::environment::{Environment, Ground, Light, Sky, Stars};
use crate::graph::{Label, NodeKind, SceneGraph};
use crate::orbit::OrbitControls;
use glam::{Mat4, Quat, Vec2, Vec3};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use wingspan_assets::{AssetError, ModelData, ModelLoader, PendingModel};
use wingspan_common::{AssetConfig, PositionFeed};
use wingspan_input::KeyboardHub;

const TERRAIN_SPIN_PER_FRAME: f32 = 0.001;
const TERRAIN_HEIGHT: f32 = -5.0;
const AXES_SIZE: f32 = 5.0;
const TITLE: &str = "Butterfly Adventure";
const TITLE_POSITION: Vec3 = Vec3::new(0.0, 5.0, -10.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKind {
    Butterfly,
    City,
}

impl SceneKind {
    pub const ALL: [SceneKind; 2] = [SceneKind::Butterfly, SceneKind::City];
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SceneKind::Butterfly => "butterfly",
            SceneKind::City => "city",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown scene '{0}' (expected 'butterfly' or 'city')")]
pub struct UnknownScene(pub String);

impl FromStr for SceneKind {
    type Err = UnknownScene;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "butterfly" => Ok(SceneKind::Butterfly),
            "city" => Ok(SceneKind::City),
            _ => Err(UnknownScene(s.to_string())),
        }
    }
}

/// Which entity a model load is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelSlot {
    Butterfly,
    City,
}

/// Which overlay panels a scene shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlayLayout {
    pub instructions: bool,
    pub debug_panel: bool,
    pub stats: bool,
    /// Progress label while models load.
    pub loader: bool,
}

/// A runnable scene, driven once per frame by the host loop.
pub trait Scene {
    fn kind(&self) -> SceneKind;
    fn camera(&self) -> &Camera;
    fn camera_mut(&mut self) -> &mut Camera;
    fn orbit_mut(&mut self) -> &mut OrbitControls;
    /// Models this scene wants loaded.
    fn model_requests(&self) -> Vec<(ModelSlot, PathBuf)>;
    fn attach_model(&mut self, slot: ModelSlot, model: Arc<ModelData>);
    fn model_failed(&mut self, slot: ModelSlot, error: &AssetError);
    /// Message to show when a model could not be loaded.
    fn load_failure(&self) -> Option<&str>;
    /// Pointer position in pixels, `None` when it left the window.
    fn pointer_moved(&mut self, _screen: Option<Vec2>, _viewport: Vec2) {}
    fn update(&mut self, tick: &FrameTick);
    fn graph(&self) -> SceneGraph;
    fn overlays(&self) -> OverlayLayout;
    /// World position of the entity the debug panel tracks, if any.
    fn tracked_position(&self) -> Option<Vec3> {
        None
    }
}

fn failure_message(slot: ModelSlot, error: &AssetError) -> String {
    let what = match slot {
        ModelSlot::Butterfly => "butterfly",
        ModelSlot::City => "city",
    };
    format!("Could not load the {what} model: {error}")
}

pub struct ButterflyScene {
    butterfly: Butterfly,
    camera: Camera,
    orbit: OrbitControls,
    environment: Environment,
    terrain: Ground,
    terrain_spin: f32,
    model_path: PathBuf,
    failure: Option<String>,
}

impl ButterflyScene {
    pub fn new(hub: &KeyboardHub, feed: PositionFeed, assets: &AssetConfig) -> Self {
        Self {
            butterfly: Butterfly::new(hub, feed),
            camera: Camera::perspective(75.0, Vec3::new(0.0, 3.0, 8.0)),
            orbit: OrbitControls::disabled(),
            environment: Environment {
                sky: Sky::default(),
                stars: Stars {
                    fade: true,
                    ..Stars::default()
                },
                lights: vec![
                    Light::Ambient { intensity: 0.5 },
                    Light::Directional {
                        position: Vec3::new(5.0, 10.0, 5.0),
                        intensity: 1.0,
                        cast_shadow: true,
                    },
                ],
            },
            terrain: Ground::terrain(),
            terrain_spin: 0.0,
            model_path: assets.butterfly_path(),
            failure: None,
        }
    }

    pub fn butterfly(&self) -> &Butterfly {
        &self.butterfly
    }

    pub fn terrain_spin(&self) -> f32 {
        self.terrain_spin
    }
}

impl Scene for ButterflyScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Butterfly
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    fn orbit_mut(&mut self) -> &mut OrbitControls {
        &mut self.orbit
    }

    fn model_requests(&self) -> Vec<(ModelSlot, PathBuf)> {
        vec![(ModelSlot::Butterfly, self.model_path.clone())]
    }

    fn attach_model(&mut self, slot: ModelSlot, model: Arc<ModelData>) {
        match slot {
            ModelSlot::Butterfly => self.butterfly.mount(model),
            ModelSlot::City => tracing::warn!("butterfly scene has no city slot"),
        }
    }

    fn model_failed(&mut self, slot: ModelSlot, error: &AssetError) {
        self.failure = Some(failure_message(slot, error));
    }

    fn load_failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    fn update(&mut self, tick: &FrameTick) {
        self.butterfly.frame(tick, &mut self.camera);
        self.terrain_spin += TERRAIN_SPIN_PER_FRAME;
        self.orbit.update(&mut self.camera);
    }

    fn graph(&self) -> SceneGraph {
        let mut graph = SceneGraph::new(self.environment.clone());
        if let Some(node) = self.butterfly.node() {
            graph.nodes.push(node);
        }
        graph.push(
            "terrain",
            Mat4::from_rotation_translation(
                Quat::from_rotation_y(self.terrain_spin),
                Vec3::new(0.0, TERRAIN_HEIGHT, 0.0),
            ),
            NodeKind::Ground(self.terrain),
        );
        graph.labels.push(Label {
            text: TITLE.into(),
            position: TITLE_POSITION,
            color: [1.0, 1.0, 1.0],
            font_size: 1.0,
        });
        graph
    }

    fn overlays(&self) -> OverlayLayout {
        OverlayLayout {
            instructions: true,
            debug_panel: true,
            stats: false,
            loader: false,
        }
    }

    fn tracked_position(&self) -> Option<Vec3> {
        Some(self.butterfly.transform().position)
    }
}

pub struct CityScene {
    city: CityModel,
    camera: Camera,
    lerp: LerpCamera,
    orbit: OrbitControls,
    environment: Environment,
    ground: Ground,
    pointer: Option<Vec2>,
    viewport: Vec2,
    model_path: PathBuf,
    failure: Option<String>,
}

impl CityScene {
    pub fn new(assets: &AssetConfig) -> Self {
        let lerp = LerpCamera::default();
        Self {
            city: CityModel::new(),
            camera: Camera::perspective(60.0, lerp.anchor),
            lerp,
            orbit: OrbitControls::default(),
            environment: Environment {
                sky: Sky::default(),
                stars: Stars::default(),
                lights: vec![
                    Light::Ambient { intensity: 0.3 },
                    Light::Directional {
                        position: Vec3::new(-5.0, 10.0, 5.0),
                        intensity: 1.0,
                        cast_shadow: true,
                    },
                    Light::Point {
                        position: Vec3::new(10.0, 10.0, 10.0),
                        intensity: 0.5,
                    },
                ],
            },
            ground: Ground::city_disk(),
            pointer: None,
            viewport: Vec2::ONE,
            model_path: assets.city_path(),
            failure: None,
        }
    }

    pub fn city(&self) -> &CityModel {
        &self.city
    }
}

impl Scene for CityScene {
    fn kind(&self) -> SceneKind {
        SceneKind::City
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    fn orbit_mut(&mut self) -> &mut OrbitControls {
        &mut self.orbit
    }

    fn model_requests(&self) -> Vec<(ModelSlot, PathBuf)> {
        vec![(ModelSlot::City, self.model_path.clone())]
    }

    fn attach_model(&mut self, slot: ModelSlot, model: Arc<ModelData>) {
        match slot {
            ModelSlot::City => self.city.mount(model),
            ModelSlot::Butterfly => tracing::warn!("city scene has no butterfly slot"),
        }
    }

    fn model_failed(&mut self, slot: ModelSlot, error: &AssetError) {
        self.failure = Some(failure_message(slot, error));
    }

    fn load_failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    fn pointer_moved(&mut self, screen: Option<Vec2>, viewport: Vec2) {
        self.pointer = screen;
        self.viewport = viewport;
    }

    fn update(&mut self, _tick: &FrameTick) {
        self.lerp.update(&mut self.camera);
        self.orbit.update(&mut self.camera);
        if self.city.is_mounted() {
            self.city.frame();
        }
        let ray = self
            .pointer
            .map(|screen| self.camera.ray_through(screen, self.viewport));
        self.city.pointer(ray.as_ref());
    }

    fn graph(&self) -> SceneGraph {
        let mut graph = SceneGraph::new(self.environment.clone());
        if let Some(node) = self.city.node() {
            graph.nodes.push(node);
        }
        graph.push("ground", Mat4::IDENTITY, NodeKind::Ground(self.ground));
        graph.push("axes", Mat4::IDENTITY, NodeKind::Axes { size: AXES_SIZE });
        graph
    }

    fn overlays(&self) -> OverlayLayout {
        OverlayLayout {
            instructions: false,
            debug_panel: false,
            stats: true,
            loader: !self.city.is_mounted() && self.failure.is_none(),
        }
    }
}

/// Build the scene for `kind`. Its key listeners live as long as the scene.
pub fn compose(
    kind: SceneKind,
    hub: &KeyboardHub,
    feed: PositionFeed,
    assets: &AssetConfig,
) -> Box<dyn Scene> {
    tracing::info!(scene = %kind, "composing scene");
    match kind {
        SceneKind::Butterfly => Box::new(ButterflyScene::new(hub, feed, assets)),
        SceneKind::City => Box::new(CityScene::new(assets)),
    }
}

/// Model loads in flight for one scene.
#[derive(Default)]
pub struct SceneAssets {
    pending: Vec<(ModelSlot, PendingModel)>,
}

impl SceneAssets {
    /// Start every load `scene` asks for. Loads that cannot even start are
    /// reported to the scene right away.
    pub fn request_all(scene: &mut dyn Scene) -> Self {
        let mut assets = Self::default();
        for (slot, path) in scene.model_requests() {
            match ModelLoader::spawn(&path) {
                Ok(pending) => assets.pending.push((slot, pending)),
                Err(err) => {
                    tracing::error!("failed to start loading {}: {err}", path.display());
                    scene.model_failed(slot, &err);
                }
            }
        }
        assets
    }

    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Mean progress of the loads still in flight.
    pub fn percent(&self) -> Option<u32> {
        if self.pending.is_empty() {
            return None;
        }
        let total: u32 = self.pending.iter().map(|(_, p)| p.progress().percent()).sum();
        Some(total / self.pending.len() as u32)
    }

    /// Hand finished loads to `scene`. Returns the models that were
    /// attached, for renderers that upload geometry.
    pub fn poll(&mut self, scene: &mut dyn Scene) -> Vec<Arc<ModelData>> {
        let mut loaded = Vec::new();
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for (slot, pending) in self.pending.drain(..) {
            match pending.poll() {
                None => still_pending.push((slot, pending)),
                Some(Ok(model)) => {
                    let model = Arc::new(model);
                    tracing::info!(
                        model = %model.name,
                        vertices = model.vertex_count(),
                        clips = model.clips.len(),
                        "model ready"
                    );
                    scene.attach_model(slot, Arc::clone(&model));
                    loaded.push(model);
                }
                Some(Err(err)) => {
                    tracing::error!("failed to load {}: {err}", pending.path().display());
                    scene.model_failed(slot, &err);
                }
            }
        }
        self.pending = still_pending;
        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use wingspan_input::{Key, KeyEvent};

    fn assets(root: &std::path::Path) -> AssetConfig {
        AssetConfig {
            root: root.to_path_buf(),
            ..AssetConfig::default()
        }
    }

    fn poll_until_done(assets: &mut SceneAssets, scene: &mut dyn Scene) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while assets.is_loading() && Instant::now() < deadline {
            assets.poll(scene);
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn scene_kind_parses() {
        assert_eq!("butterfly".parse::<SceneKind>().unwrap(), SceneKind::Butterfly);
        assert_eq!(" City ".parse::<SceneKind>().unwrap(), SceneKind::City);
        assert!("forest".parse::<SceneKind>().is_err());
        for kind in SceneKind::ALL {
            assert_eq!(kind.to_string().parse::<SceneKind>().unwrap(), kind);
        }
    }

    #[test]
    fn butterfly_scene_follows_and_publishes() {
        let hub = KeyboardHub::new();
        let feed = PositionFeed::new();
        let mut scene = compose(SceneKind::Butterfly, &hub, feed.clone(), &AssetConfig::default());
        assert_eq!(scene.kind(), SceneKind::Butterfly);
        assert!((scene.camera().fov_y - 75f32.to_radians()).abs() < 1e-6);

        hub.dispatch(KeyEvent::down(Key::ArrowUp));
        scene.update(&FrameTick::fixed(1, 60.0));
        let pos = feed.latest().unwrap();
        assert!(pos.abs_diff_eq(Vec3::new(0.0, 2.1, 0.0), 1e-6));
        assert!(scene.camera().eye.abs_diff_eq(Vec3::new(0.0, 5.1, 8.0), 1e-5));
        assert_eq!(scene.tracked_position(), Some(pos));

        let layout = scene.overlays();
        assert!(layout.instructions && layout.debug_panel && !layout.stats);
    }

    #[test]
    fn butterfly_graph_has_terrain_and_title() {
        let hub = KeyboardHub::new();
        let mut scene = ButterflyScene::new(&hub, PositionFeed::new(), &AssetConfig::default());
        for frame in 1..=10 {
            scene.update(&FrameTick::fixed(frame, 60.0));
        }
        assert!((scene.terrain_spin() - 0.01).abs() < 1e-6);
        let graph = scene.graph();
        let terrain = graph.node("terrain").unwrap();
        assert_eq!(terrain.transform.w_axis.y, TERRAIN_HEIGHT);
        assert!(graph.node("butterfly").is_none());
        assert_eq!(graph.labels[0].text, "Butterfly Adventure");
        assert_eq!(graph.labels[0].position, Vec3::new(0.0, 5.0, -10.0));
        assert!(graph.environment.stars.fade);
    }

    #[test]
    fn dropping_scene_releases_keys() {
        let hub = KeyboardHub::new();
        let feed = PositionFeed::new();
        let scene = compose(SceneKind::Butterfly, &hub, feed, &AssetConfig::default());
        assert_eq!(hub.listener_count(), 2);
        drop(scene);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn city_camera_lerps_toward_anchor() {
        let mut scene = CityScene::new(&AssetConfig::default());
        scene.camera_mut().eye = Vec3::new(9.5, 1.0, 2.0);
        scene.update(&FrameTick::fixed(1, 60.0));
        assert!(scene.camera().eye.abs_diff_eq(Vec3::new(9.0, 1.0, 2.0), 1e-5));
        assert_eq!(scene.camera().target, Vec3::ZERO);
        assert_eq!(scene.city().yaw(), 0.0);

        let graph = scene.graph();
        assert!(graph.node("ground").is_some());
        assert!(matches!(graph.node("axes").unwrap().kind, NodeKind::Axes { size } if size == 5.0));
        assert_eq!(graph.environment.lights.len(), 3);
        assert!(scene.overlays().loader && scene.overlays().stats);
    }

    #[test]
    fn city_does_not_spin_before_it_loads() {
        let mut scene = CityScene::new(&AssetConfig::default());
        for frame in 1..=600 {
            scene.update(&FrameTick::fixed(frame, 60.0));
        }
        assert!(!scene.city().is_mounted());
        assert_eq!(scene.city().yaw(), 0.0);
    }

    #[test]
    fn missing_model_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = CityScene::new(&assets(dir.path()));
        let mut loads = SceneAssets::request_all(&mut scene);
        poll_until_done(&mut loads, &mut scene);
        assert!(!loads.is_loading());
        assert_eq!(loads.percent(), None);
        let message = scene.load_failure().unwrap();
        assert!(message.starts_with("Could not load the city model"));
        assert!(!scene.overlays().loader);
        // The rest of the scene keeps running.
        scene.update(&FrameTick::fixed(1, 60.0));
        assert!(scene.graph().node("ground").is_some());
    }

    #[test]
    fn model_requests_resolve_against_root() {
        let config = assets(std::path::Path::new("/data"));
        let hub = KeyboardHub::new();
        let butterfly = ButterflyScene::new(&hub, PositionFeed::new(), &config);
        assert_eq!(
            butterfly.model_requests(),
            vec![(ModelSlot::Butterfly, PathBuf::from("/data/animated_butterfly.glb"))]
        );
        let city = CityScene::new(&config);
        assert_eq!(
            city.model_requests(),
            vec![(ModelSlot::City, PathBuf::from("/data/models/city.glb"))]
        );
    }
}
