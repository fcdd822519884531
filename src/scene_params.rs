use serde::{Deserialize, Serialize};

// Parameters that define the scene. Field sections are replaced wholesale by
// the debug panel, everything else is fixed after startup.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct SceneParams {
    pub demo: Demo,
    pub fps: f64,

    #[serde(default)]
    pub camera: CameraParams,

    #[serde(default)]
    pub flame: FlameParams,

    #[serde(default)]
    pub smoke: SmokeParams,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Demo {
    // Lit test cube, no particles.
    Cube,
    Flame,
    FlameSmoke,
}

impl Demo {
    pub fn has_flame(&self) -> bool {
        matches!(self, Demo::Flame | Demo::FlameSmoke)
    }

    pub fn has_smoke(&self) -> bool {
        matches!(self, Demo::FlameSmoke)
    }

    pub fn has_test_cube(&self) -> bool {
        matches!(self, Demo::Cube)
    }
}

impl std::str::FromStr for Demo {
    type Err = anyhow::Error;
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "cube" => Ok(Demo::Cube),
            "flame" => Ok(Demo::Flame),
            "flame_smoke" => Ok(Demo::FlameSmoke),
            _ => Err(anyhow::anyhow!(
                "unknown demo '{}', expected one of: cube, flame, flame_smoke",
                name
            )),
        }
    }
}

// Where particles are placed along the vertical axis relative to the origin.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerticalPolicy {
    // [-height/2, height/2)
    Centered,
    // [0, height)
    Upward,
}

impl VerticalPolicy {
    pub fn lower_bound(&self, height: f32) -> f32 {
        match self {
            VerticalPolicy::Centered => -height / 2.0,
            VerticalPolicy::Upward => 0.0,
        }
    }
}

// Shape of a particle field, shared by every effect.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct FieldParams {
    pub count: u32,
    pub point_size: f32,
    pub radius: f32,
    pub height: f32,
    pub speed_factor: f32,
    pub origin: [f32; 3],
    pub vertical: VerticalPolicy,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct FlameParams {
    pub inner_color: [f32; 3],
    pub outer_color: [f32; 3],
    pub field: FieldParams,
}

impl Default for FlameParams {
    fn default() -> Self {
        FlameParams {
            field: FieldParams {
                count: 500,
                point_size: 120.0,
                radius: 0.4,
                height: 1.2,
                speed_factor: 0.6,
                origin: [0.0, -0.5, 0.0],
                vertical: VerticalPolicy::Upward,
            },
            inner_color: [1.0, 0.85, 0.35],
            outer_color: [0.95, 0.25, 0.05],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct SmokeParams {
    pub color: [f32; 3],
    pub wind: [f32; 3],
    pub wave_amplitude: f32,
    pub wave_period: f32,
    pub field: FieldParams,
}

impl Default for SmokeParams {
    fn default() -> Self {
        SmokeParams {
            field: FieldParams {
                count: 300,
                point_size: 200.0,
                radius: 0.5,
                height: 2.0,
                speed_factor: 0.3,
                origin: [0.0, 1.5, 0.0],
                vertical: VerticalPolicy::Centered,
            },
            color: [0.35, 0.33, 0.32],
            wind: [0.25, 0.0, 0.05],
            wave_amplitude: 0.1,
            wave_period: 3.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CameraParams {
    // Vertical field of view, degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub enable_damping: bool,
    pub damping_factor: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        CameraParams {
            fov: 75.0,
            near: 0.1,
            far: 100.0,
            position: [2.0, 2.0, 2.0],
            target: [0.0, 0.0, 0.0],
            enable_damping: true,
            damping_factor: 0.05,
        }
    }
}

impl std::str::FromStr for SceneParams {
    type Err = toml::de::Error;
    fn from_str(serialized: &str) -> Result<Self, Self::Err> {
        let params = toml::from_str(serialized)?;
        Ok(params)
    }
}

impl Default for SceneParams {
    fn default() -> Self {
        SceneParams {
            demo: Demo::FlameSmoke,
            fps: 60.0,
            camera: CameraParams::default(),
            flame: FlameParams::default(),
            smoke: SmokeParams::default(),
        }
    }
}

pub fn get_scene_config_from_default_file() -> SceneParams {
    let config_data = include_str!("../scene_config.toml");
    match config_data.parse() {
        Ok(params) => params,
        Err(e) => {
            log::error!(
                "Failed to parse config file({}): {:?}",
                "../scene_config.toml",
                e
            );
            SceneParams::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke() {
        let params = SceneParams {
            demo: Demo::Flame,
            fps: 30.0,
            camera: CameraParams::default(),
            flame: FlameParams::default(),
            smoke: SmokeParams::default(),
        };
        let serialized = toml::to_string(&params).unwrap();
        println!("serialized = {}", serialized);
        let deserialized: SceneParams = toml::from_str(&serialized).unwrap();
        assert_eq!(params, deserialized);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let params: SceneParams = "demo = \"cube\"\nfps = 60.0\n".parse().unwrap();
        assert_eq!(params.demo, Demo::Cube);
        assert_eq!(params.flame, FlameParams::default());
        assert_eq!(params.smoke, SmokeParams::default());
        assert_eq!(params.camera, CameraParams::default());
    }

    #[test]
    fn default_file_parses() {
        let params = get_scene_config_from_default_file();
        assert!(params.flame.field.count >= 1);
        assert!(params.smoke.field.count >= 1);
    }

    #[test]
    fn demo_names() {
        assert_eq!("cube".parse::<Demo>().unwrap(), Demo::Cube);
        assert_eq!("flame_smoke".parse::<Demo>().unwrap(), Demo::FlameSmoke);
        assert!("fire".parse::<Demo>().is_err());
        assert!(Demo::FlameSmoke.has_smoke());
        assert!(!Demo::Flame.has_smoke());
        assert!(Demo::Cube.has_test_cube());
    }

    #[test]
    fn vertical_bounds() {
        assert_eq!(VerticalPolicy::Centered.lower_bound(2.0), -1.0);
        assert_eq!(VerticalPolicy::Upward.lower_bound(2.0), 0.0);
    }
}
