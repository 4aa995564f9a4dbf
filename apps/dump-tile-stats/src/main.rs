// This file is part of Neon.
//
// Neon is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Neon is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Neon.  If not, see <http://www.gnu.org/licenses/>.
use anyhow::Result;
use std::time::Instant;
use structopt::StructOpt;
use terminal_size::{terminal_size, Width};
use tiles::{GridBuilder, TileBuffer};

/// Build the disk grid offline and report on what the tile pipeline produced.
#[derive(Debug, StructOpt)]
#[structopt(set_term_width = if let Some((Width(w), _)) = terminal_size() { w as usize } else { 80 })]
struct Opt {
    /// Disk radius in world units.
    #[structopt(short, long, default_value = "500")]
    radius: f64,

    /// Maximum number of leaf tiles to generate.
    #[structopt(short, long, default_value = "900000")]
    budget: usize,

    /// Fraction of leaves flagged as bad data.
    #[structopt(long, default_value = "0.005")]
    bad_rate: f64,

    /// Number of pre-merged detail levels.
    #[structopt(short, long, default_value = "6")]
    levels: u8,

    /// Seed the bad-data draws for a reproducible grid.
    #[structopt(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let mut grid = GridBuilder::new(opt.radius, opt.budget).with_bad_rate(opt.bad_rate);
    if let Some(seed) = opt.seed {
        grid = grid.with_seed(seed);
    }

    let start = Instant::now();
    let buffer = TileBuffer::new(&grid, opt.levels);
    let elapsed = start.elapsed();

    let pyramid = buffer.pyramid();
    let leaves = pyramid.leaves();
    let bad = leaves.iter().filter(|t| t.is_bad()).count();
    let mean_radial = if leaves.is_empty() {
        0.0
    } else {
        leaves.iter().map(|t| t.radial_distance() as f64).sum::<f64>() / leaves.len() as f64
    };

    println!("grid:");
    println!("  radius:      {}", grid.radius());
    println!("  budget:      {}", grid.budget());
    println!("  tile side:   {:.4}", grid.tile_side());
    println!("  leaves:      {}", leaves.len());
    println!(
        "  bad tiles:   {} ({:.4}% of leaves)",
        bad,
        100.0 * bad as f64 / leaves.len().max(1) as f64
    );
    println!("  mean radial: {:.4}", mean_radial);
    println!("pyramid:");
    for k in 0..pyramid.level_count() {
        if let Some(level) = pyramid.level(k) {
            println!(
                "  level {}: {:>9} tiles of side {:.3}",
                k,
                level.len(),
                level.side()
            );
        }
    }
    println!("quadtree:");
    println!("  items:          {}", buffer.index().len());
    println!("  nodes:          {}", buffer.index().node_count());
    println!("  occupied depth: {}", buffer.index().occupied_depth());
    println!("built in {:.1} ms", elapsed.as_secs_f64() * 1_000.0);

    Ok(())
}
