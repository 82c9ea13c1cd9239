use clap::{Parser, Subcommand};
use console::Term;
use miette::{IntoDiagnostic, Result};

use libfe2save::container::{self, IntegrityReport};
use libfe2save::state::{self, GameObjectRecord, GameState};
use libfe2save::{selftest, tables};

#[derive(Parser, Debug)]
#[command(name = "FE2 Savegame CLI")]
#[command(about, author, version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decrypt a savegame into its raw memory image
    #[command(arg_required_else_help = true)]
    Decrypt {
        /// Savegame file
        source: String,
        /// Output file for the memory image
        dest: String,
    },
    /// Encrypt a raw memory image back into a savegame
    #[command(arg_required_else_help = true)]
    Encrypt {
        /// Memory image file
        source: String,
        /// Output savegame file
        dest: String,
    },
    /// Print the player and object state stored in a savegame
    #[command(arg_required_else_help = true)]
    Inspect {
        /// Savegame file
        source: String,
    },
    /// Decode a savegame and compare every phase against a known-good image
    #[command(arg_required_else_help = true)]
    SelfTestDecrypt {
        /// Savegame file
        source: String,
        /// Known-good memory image
        truth: String,
    },
    /// Encode a memory image and compare every phase against a known-good savegame
    #[command(arg_required_else_help = true)]
    SelfTestEncrypt {
        /// Memory image file
        source: String,
        /// Known-good savegame file
        truth: String,
    },
}

pub fn main() -> Result<()> {
    let stdout = Term::stdout();
    let cli = Cli::parse();

    match cli.command {
        Commands::Decrypt { source, dest } => command_decrypt(stdout, source, dest)?,
        Commands::Encrypt { source, dest } => command_encrypt(stdout, source, dest)?,
        Commands::Inspect { source } => command_inspect(stdout, source)?,
        Commands::SelfTestDecrypt { source, truth } => {
            command_self_test_decrypt(stdout, source, truth)?
        }
        Commands::SelfTestEncrypt { source, truth } => {
            command_self_test_encrypt(stdout, source, truth)?
        }
    }

    Ok(())
}

fn command_decrypt(stdout: Term, source: String, dest: String) -> Result<()> {
    let bytes = std::fs::read(source).into_diagnostic()?;
    let save = container::decode(&bytes)?;

    report_integrity(&stdout, &save.report)?;
    std::fs::write(dest, &save.image).into_diagnostic()?;

    let text = format!("Wrote {} bytes of memory image.", save.image.len());
    stdout.write_line(&text).into_diagnostic()?;

    Ok(())
}

fn command_encrypt(stdout: Term, source: String, dest: String) -> Result<()> {
    let image = std::fs::read(source).into_diagnostic()?;
    let encoded = container::encode(&image)?;

    std::fs::write(dest, &encoded.file).into_diagnostic()?;

    let text = format!("Wrote {} bytes of savegame.", encoded.file.len());
    stdout.write_line(&text).into_diagnostic()?;

    Ok(())
}

fn command_inspect(stdout: Term, source: String) -> Result<()> {
    let bytes = std::fs::read(source).into_diagnostic()?;
    let save = container::decode(&bytes)?;

    report_integrity(&stdout, &save.report)?;

    let game = state::decode(&save.image)?;
    report_player(&stdout, &game)?;

    for record in game.objects.iter().flatten() {
        report_object(&stdout, &game, record)?;
    }

    Ok(())
}

fn command_self_test_decrypt(stdout: Term, source: String, truth: String) -> Result<()> {
    let file = std::fs::read(source).into_diagnostic()?;
    let truth = std::fs::read(truth).into_diagnostic()?;

    let save = container::decode(&file)?;
    selftest::verify_phase("unsquish", &save.compressed, &save.image, &truth)?;

    // Run the inverse pipeline over the ground truth as well, so the
    // encoder phases are checked against the very same file.
    let encoded = container::encode(&truth)?;
    selftest::verify_phase("squish", &truth, &encoded.compressed, &save.compressed)?;
    selftest::verify_phase("encrypt", &encoded.compressed, &encoded.file, &file)?;

    stdout
        .write_line("Self-test passed: decrypt, unsquish, squish and encrypt all match.")
        .into_diagnostic()?;

    Ok(())
}

fn command_self_test_encrypt(stdout: Term, source: String, truth: String) -> Result<()> {
    let image = std::fs::read(source).into_diagnostic()?;
    let truth_file = std::fs::read(truth).into_diagnostic()?;

    let encoded = container::encode(&image)?;
    let reference = container::decode(&truth_file)?;

    selftest::verify_phase("squish", &image, &encoded.compressed, &reference.compressed)?;
    selftest::verify_phase("encrypt", &encoded.compressed, &encoded.file, &truth_file)?;

    stdout
        .write_line("Self-test passed: squish and encrypt match the reference savegame.")
        .into_diagnostic()?;

    Ok(())
}

fn report_integrity(stdout: &Term, report: &IntegrityReport) -> Result<()> {
    if !report.magic_ok() {
        let text = format!(
            "Incorrect magic for a savegame: {:#06x} (expected {:#06x}).",
            report.magic,
            libfe2save::SAVE_MAGIC
        );
        stdout.write_line(&text).into_diagnostic()?;
    }

    if report.odd_ciphertext {
        stdout
            .write_line("Ciphertext had odd length; trailing byte ignored.")
            .into_diagnostic()?;
    }

    if !report.footer_ok() {
        let text = format!(
            "Incorrect footer: computed {:#010x}, stored {:#010x}.",
            report.footer_computed, report.footer_stored
        );
        stdout.write_line(&text).into_diagnostic()?;
    }

    Ok(())
}

fn report_player(stdout: &Term, game: &GameState) -> Result<()> {
    let player = &game.player;
    let date = player.date();

    let ship = match game.own_ship() {
        Some(record) => describe_name(record),
        None => format!("missing slot {}", player.own_ship),
    };

    let text = format!(
        "Date: {:02}-{:02}-{}\nShip: {}\nMoney: {}.{} credits\nFuel: {} t; Cargo: {} t\nFederal rank: {}; Imperial rank: {}\nCombat rating: {} ({} kills)\n",
        date.day,
        date.month,
        date.year,
        ship,
        player.money / 10,
        (player.money % 10).abs(),
        player.fuel,
        player.cargo,
        tables::threshold_label(player.federal_points, &tables::FEDERAL_RANKS),
        tables::threshold_label(player.imperial_points, &tables::IMPERIAL_RANKS),
        tables::threshold_label(player.kills, &tables::COMBAT_RATINGS),
        player.kills,
    );
    stdout.write_line(&text).into_diagnostic()?;

    Ok(())
}

fn report_object(stdout: &Term, game: &GameState, record: &GameObjectRecord) -> Result<()> {
    let mut lines = vec![format!(
        "Slot {:#04x}: type {:#04x}, {}",
        record.slot,
        record.type_id,
        describe_name(record)
    )];

    lines.push(format!(
        "  speed {}.{}; bounty {}; accel +{}/-{}{}",
        record.speed / 10,
        record.speed % 10,
        record.bounty,
        record.accel_forward,
        record.accel_reverse,
        if record.shooting_started {
            "; shooting"
        } else {
            ""
        }
    ));

    if let Some(near) = game.relative_of(record) {
        lines.push(format!("  near: {}", describe_name(near)));
    }

    let mut equipment: Vec<&str> = Vec::new();
    equipment.extend(tables::flag_labels(record.equipment[0], &tables::EQUIPMENT_A));
    equipment.extend(tables::flag_labels(record.equipment[1], &tables::EQUIPMENT_B));
    equipment.extend(tables::flag_labels(record.equipment[2], &tables::EQUIPMENT_C));
    if !equipment.is_empty() {
        lines.push(format!("  equipment: {}", equipment.join(", ")));
    }

    lines.push(format!("  drive: {}", tables::drive_label(record.drive)));

    if !record.guns.is_empty() {
        let guns: Vec<&str> = record
            .guns
            .iter()
            .map(|&position| tables::gun_mount_label(position))
            .collect();
        lines.push(format!("  guns: {}", guns.join(", ")));
    }

    stdout.write_line(&lines.join("\n")).into_diagnostic()?;

    Ok(())
}

fn describe_name(record: &GameObjectRecord) -> String {
    match &record.name {
        Some(name) => name.clone(),
        None => format!("unnamed object {:#04x}", record.slot),
    }
}
