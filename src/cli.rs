use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::config::SceneConfig;
use crate::generators::{self, GeneratedPositions, SpiralCone};
use crate::input::PoseFrame;
use crate::persistence::{JsonDirPhotoStore, PhotoRef, PhotoStore, StoreError};
use crate::scene::Scene;
use crate::scene_state::SceneState;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scene headless, driven by a recorded pose stream
    Simulate {
        /// Pose frames, one JSON object per line. Blank or malformed lines count as "no hands".
        #[arg(long)]
        poses: Option<PathBuf>,

        /// Scene config (JSON). Missing fields use defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f32,

        /// Number of frames (defaults to the number of pose frames, or one second)
        #[arg(long)]
        frames: Option<u32>,

        /// Initial state, applied as a command before the first frame
        #[arg(long, value_enum)]
        state: Option<StateArg>,

        /// Photo store directory to load the photo list from
        #[arg(long, requires = "tree")]
        store: Option<PathBuf>,

        /// Id of the photo list inside --store
        #[arg(long, requires = "store")]
        tree: Option<String>,

        /// Output directory for full per-frame JSON dumps
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print one generator's FORMED and CHAOS arrangements as JSON
    Generate {
        #[arg(value_enum)]
        layout: LayoutArg,

        #[arg(long, default_value_t = 100)]
        count: usize,

        #[arg(long)]
        seed: Option<u64>,
    },
    /// Save a photo list and print its id
    Save {
        #[arg(long)]
        store: PathBuf,

        /// Image references
        photos: Vec<String>,
    },
    /// Print a stored photo list
    Load {
        #[arg(long)]
        store: PathBuf,

        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StateArg {
    Chaos,
    Formed,
}

impl From<StateArg> for SceneState {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Chaos => SceneState::Chaos,
            StateArg::Formed => SceneState::Formed,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Foliage,
    Ornaments,
    Snowflakes,
    Gifts,
    Sparkles,
    Stars,
    Dust,
    Photos,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            poses,
            config,
            fps,
            frames,
            state,
            store,
            tree,
            out,
        } => {
            let options = SimulateOptions {
                poses,
                config,
                fps,
                frames,
                state: state.map(SceneState::from),
                photos: store.zip(tree),
                out,
            };
            simulate(options)?;
        }
        Commands::Generate { layout, count, seed } => {
            let positions = generate(layout, count, seed);
            println!("{}", serde_json::to_string_pretty(&positions)?);
        }
        Commands::Save { store, photos } => {
            let mut store = JsonDirPhotoStore::open(&store)?;
            let photos: Vec<PhotoRef> = photos.into_iter().map(PhotoRef::new).collect();
            println!("{}", store.save(&photos)?);
        }
        Commands::Load { store, id } => {
            let store = JsonDirPhotoStore::open(&store)?;
            for photo in store.load(&id)? {
                println!("{}", photo);
            }
        }
    }
    Ok(())
}

struct SimulateOptions {
    poses: Option<PathBuf>,
    config: Option<PathBuf>,
    fps: f32,
    frames: Option<u32>,
    state: Option<SceneState>,
    photos: Option<(PathBuf, String)>,
    out: Option<PathBuf>,
}

/// One line of simulation output.
#[derive(Serialize)]
struct FrameSummary<'a> {
    frame: u32,
    time: f32,
    state: SceneState,
    azimuth: f32,
    polar: f32,
    cursor_active: bool,
    groups: Vec<GroupSummary<'a>>,
}

#[derive(Serialize)]
struct GroupSummary<'a> {
    name: &'a str,
    count: usize,
    progress: f32,
}

fn read_pose_stream(path: &Path) -> Result<Vec<PoseFrame>> {
    let file = File::open(path).with_context(|| format!("opening pose stream {}", path.display()))?;
    let mut frames = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        frames.push(if line.trim().is_empty() {
            PoseFrame::empty()
        } else {
            PoseFrame::from_json_lenient(&line)
        });
    }
    Ok(frames)
}

fn load_photos(store_dir: &Path, id: &str) -> Result<Vec<PhotoRef>> {
    let store = JsonDirPhotoStore::open(store_dir)?;
    match store.load(id) {
        Ok(photos) => Ok(photos),
        Err(StoreError::NotFound(_)) => {
            log::warn!("Photo list {} not found, using placeholders", id);
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

fn simulate(options: SimulateOptions) -> Result<()> {
    if options.fps.is_nan() || options.fps <= 0.0 {
        anyhow::bail!("--fps must be positive");
    }
    let config = match &options.config {
        Some(path) => SceneConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    let poses = match &options.poses {
        Some(path) => read_pose_stream(path)?,
        None => Vec::new(),
    };
    let photos = match &options.photos {
        Some((dir, id)) => load_photos(dir, id)?,
        None => Vec::new(),
    };
    let frame_count = options
        .frames
        .unwrap_or(if poses.is_empty() { options.fps.round() as u32 } else { poses.len() as u32 });

    if let Some(out) = &options.out {
        std::fs::create_dir_all(out)?;
    }

    let mut scene = Scene::with_photos(config, photos);
    if let Some(state) = options.state {
        scene.set_state(state);
    }
    let feed = scene.pose_feed();
    let dt = 1.0 / options.fps;
    log::info!("Simulating {} frames at {} fps", frame_count, options.fps);

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    for i in 0..frame_count {
        if let Some(pose) = poses.get(i as usize) {
            feed.publish(pose.clone());
        }
        let frame = scene.tick(dt);

        let summary = FrameSummary {
            frame: i,
            time: frame.time,
            state: frame.state,
            azimuth: frame.camera.azimuth,
            polar: frame.camera.polar,
            cursor_active: frame.cursor.active,
            groups: scene
                .groups()
                .map(|g| GroupSummary {
                    name: g.name(),
                    count: g.count(),
                    progress: g.progress(),
                })
                .collect(),
        };
        writeln!(stdout, "{}", serde_json::to_string(&summary)?)?;

        if let Some(out) = &options.out {
            let path = out.join(format!("frame_{:05}.json", i));
            std::fs::write(&path, serde_json::to_vec(&frame)?)
                .with_context(|| format!("writing {}", path.display()))?;
        }
    }
    Ok(())
}

fn generate(layout: LayoutArg, count: usize, seed: Option<u64>) -> GeneratedPositions {
    let mut rng = generators::scene_rng(seed);
    let cone = SpiralCone::default();
    let fixed = |positions: Vec<glam::Vec3>| GeneratedPositions {
        formed: positions.clone(),
        chaos: positions,
    };
    match layout {
        LayoutArg::Foliage => generators::foliage(count, &cone, &mut rng),
        LayoutArg::Ornaments => generators::spiral_band(count, &cone, &mut rng),
        LayoutArg::Snowflakes => generators::snowflakes(count, &cone, &mut rng),
        LayoutArg::Gifts => generators::gift_ring(count, &Default::default(), &mut rng).0,
        LayoutArg::Sparkles => generators::cone_volume(count, &Default::default(), &mut rng).0,
        LayoutArg::Stars => fixed(generators::shell_field(count, 60.0, 120.0, &mut rng).0),
        LayoutArg::Dust => fixed(generators::shell_field(count, 25.0, 35.0, &mut rng).0),
        LayoutArg::Photos => generators::photo_spiral(count, &mut rng),
    }
}
