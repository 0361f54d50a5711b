// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use clap::Parser;
use log::{error, info, warn};
use psx_cdrom::core::cdrom::{CDPosition, IrqType, CDROM, SECTOR_SIZE};
use psx_cdrom::core::error::Result;
use psx_cdrom::core::system::System;

/// Cycles to wait for any single answer (~1.5s of machine time)
const ANSWER_TIMEOUT: u64 = 50_000_000;

/// Drive the CD-ROM controller through a scripted read session
#[derive(Parser)]
#[command(name = "psx-cdrom")]
#[command(about = "PlayStation CD-ROM controller driver", long_about = None)]
struct Args {
    /// Path to CD-ROM disc image (.cue file)
    #[arg(short = 'c', long)]
    cue: Option<String>,

    /// First sector to read (LBA, 0 = 00:02:00)
    #[arg(short = 'l', long, default_value = "0")]
    lba: i32,

    /// Number of sectors to read
    #[arg(short = 'n', long, default_value = "4")]
    sectors: u32,

    /// Drive speed (1 or 2)
    #[arg(
        short = 's',
        long,
        default_value = "1",
        value_parser = clap::value_parser!(u8).range(1..=2)
    )]
    speed: u8,

    /// Write a save state here when the script finishes
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// Print the final save state as JSON
    #[arg(long)]
    dump_json: bool,
}

/// Write parameters and a command byte the way the BIOS does
fn send_command(system: &mut System, cmd: u8, params: &[u8]) {
    system.write_register(CDROM::REG_STATUS, 0x01);
    for &param in params {
        system.write_register(CDROM::REG_COMMAND, param);
    }
    system.write_register(CDROM::REG_STATUS, 0x00);
    system.write_register(CDROM::REG_COMMAND, cmd);
}

/// Wait for the next interrupt and return it with the response bytes
fn wait_answer(system: &mut System) -> Option<(IrqType, Vec<u8>)> {
    if !system.run_until_irq(ANSWER_TIMEOUT) {
        warn!(
            "No interrupt within {} cycles (cycle {})",
            ANSWER_TIMEOUT,
            system.total_cycles()
        );
        return None;
    }

    let response = system.cdrom().response_bytes();
    let irq = system.acknowledge_irq()?;
    Some((irq, response))
}

fn exec(system: &mut System, name: &str, cmd: u8, params: &[u8]) -> Option<(IrqType, Vec<u8>)> {
    send_command(system, cmd, params);
    let answer = wait_answer(system);
    if let Some((irq, response)) = &answer {
        info!(
            "{:<8} -> INT{} {:02X?} @ cycle {}",
            name,
            *irq as u8,
            response,
            system.total_cycles()
        );
    }
    answer
}

/// Two-phase commands: acknowledge, then completion
fn exec_two_phase(system: &mut System, name: &str, cmd: u8) {
    if let Some((IrqType::Acknowledge, _)) = exec(system, name, cmd, &[]) {
        if let Some((irq, response)) = wait_answer(system) {
            info!(
                "{:<8} -> INT{} {:02X?} @ cycle {}",
                name,
                irq as u8,
                response,
                system.total_cycles()
            );
        }
    }
}

fn read_sectors(system: &mut System, count: u32) {
    for n in 0..count {
        let Some((irq, response)) = wait_answer(system) else {
            return;
        };
        if irq != IrqType::DataReady {
            error!("Read stopped: INT{} {:02X?}", irq as u8, response);
            return;
        }

        let data: Vec<u8> = (0..SECTOR_SIZE)
            .map(|_| system.read_register(CDROM::REG_DATA))
            .collect();
        let checksum = data.iter().fold(0u32, |acc, &b| acc.wrapping_add(b as u32));
        info!(
            "Sector {:>3}: header {:02X?} sum=0x{:08X} @ cycle {}",
            n,
            &data[12..16],
            checksum,
            system.total_cycles()
        );
    }
}

fn main() -> Result<()> {
    // Load .env file if present (RUST_LOG and friends)
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("psx-cdrom v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let mut system = System::new();

    if let Some(cue) = &args.cue {
        info!("Loading disc from: {}", cue);
        if let Err(e) = system.load_disc(cue) {
            error!("Failed to load disc: {}", e);
            return Err(e);
        }
    }

    exec(&mut system, "GetStat", 0x01, &[]);
    exec(&mut system, "GetID", 0x1A, &[]);
    exec(&mut system, "GetTN", 0x13, &[]);

    if system.cdrom().has_disc() {
        let target = CDPosition::from_lba(args.lba).to_bcd();
        let mode = if args.speed == 2 { 0x80 } else { 0x00 };

        exec(&mut system, "SetMode", 0x0E, &[mode]);
        exec(&mut system, "SetLoc", 0x02, &target);
        exec(&mut system, "ReadN", 0x06, &[]);
        read_sectors(&mut system, args.sectors);
        exec_two_phase(&mut system, "Pause", 0x09);
    }

    info!("Finished at cycle {}", system.total_cycles());

    let state = system.save_state();
    if let Some(path) = &args.save_state {
        state.save_to_file(path)?;
        info!("Save state written to {}", path.display());
    }
    if args.dump_json {
        println!("{}", state.to_json()?);
    }

    Ok(())
}
