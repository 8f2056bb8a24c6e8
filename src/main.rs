use std::path::PathBuf;

use anyhow::{Context, Result};
use bvh_motion::parse::load_bvh_from_file;
use bvh_motion::player::MotionPlayer;
use bvh_motion::skeleton::Skeleton;
use bvh_motion::types::{Index, Position};
use clap::Parser;

/// Load a .bvh file and print joint positions frame by frame
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to the .bvh file
    file: PathBuf,

    /// Stop after this many frames
    #[arg(short, long)]
    frames: Option<usize>,

    /// Only print the joint with this name
    #[arg(short, long)]
    joint: Option<String>,

    /// Print the rest pose and skip playback
    #[arg(long)]
    rest: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = verbosity_level(cli.verbose) {
        logger.filter_level(level);
    }
    logger.init();

    let mut skeleton = load_bvh_from_file(&cli.file)
        .with_context(|| format!("Failed to load {}", cli.file.display()))?;

    print_hierarchy(&skeleton);

    let selected: Vec<Index> = match &cli.joint {
        Some(name) => vec![skeleton
            .find(name)
            .with_context(|| format!("No joint named '{}'", name))?
            .index()],
        None => skeleton
            .preorder()
            .into_iter()
            .filter(|&i| skeleton.nodes()[i].name().is_some())
            .collect(),
    };

    if cli.rest {
        println!("rest pose");
        for &index in &selected {
            if let Some(position) = skeleton.rest_absolute_offset(index) {
                print_position(&skeleton, index, position);
            }
        }
        return Ok(());
    }

    let limit = cli.frames.unwrap_or(usize::MAX);
    let mut player = MotionPlayer::new(&mut skeleton);
    while player.current_frame_index().map_or(0, |f| f + 1) < limit && player.step()? {
        let frame = player.current_frame_index().unwrap_or_default();
        println!(
            "frame {} (t = {:.4}s)",
            frame,
            frame as f64 * player.frame_time_seconds()
        );
        for &index in &selected {
            if let Some(position) = player.skeleton().absolute_offset(index) {
                print_position(player.skeleton(), index, position);
            }
        }
    }
    log::info!("Stopped after {:?} frames", player.current_frame_index().map(|f| f + 1));

    Ok(())
}

/// Level forced by `-v` flags. Without any, `RUST_LOG` decides (warn by default).
fn verbosity_level(verbose: u8) -> Option<log::LevelFilter> {
    match verbose {
        0 => None,
        1 => Some(log::LevelFilter::Info),
        2 => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    }
}

fn print_hierarchy(skeleton: &Skeleton) {
    println!(
        "{} roots, {} nodes, {} channels, {} frames, {:.6}s per frame ({} fps)",
        skeleton.roots().len(),
        skeleton.len(),
        skeleton.channel_bindings().len(),
        skeleton.frame_count(),
        skeleton.frame_time_seconds(),
        skeleton.fps()
    );
    for index in skeleton.preorder() {
        let node = &skeleton.nodes()[index];
        let depth = skeleton.depth(index).unwrap_or_default();
        let channels: Vec<String> = node
            .channels()
            .iter()
            .map(|&c| skeleton.channel_bindings()[c].kind.to_string())
            .collect();
        println!(
            "{}{} [{}]",
            "  ".repeat(depth),
            node.name().unwrap_or("End Site"),
            channels.join(" ")
        );
    }
}

fn print_position(skeleton: &Skeleton, index: Index, position: Position) {
    let name = skeleton
        .node(index)
        .and_then(|node| node.name())
        .unwrap_or("End Site");
    println!(
        "  {:<24} {:>10.4} {:>10.4} {:>10.4}",
        name, position.x, position.y, position.z
    );
}
