//! Command dispatch for the Rift DM REPL.
//!
//! A simple line-oriented protocol:
//! - Lines starting with `!` are commands (`!helpme` lists them)
//! - `!askdm <action>` rolls dice and sends the action to the narrator
//! - `quit` exits
//!
//! Output is bracket-tagged (`[DM]`, `[ROLL]`, `[PARTY]`, `[CHAR]`,
//! `[ERROR]`, `[STATUS]`) so transcripts stay easy to scan.

use std::io::{self, BufRead, Write};

use riftdm_core::log::QuestLog;
use riftdm_core::narrator::Narrator;
use riftdm_core::{Character, PlayerId, SessionEngine};

/// Run the REPL until `quit` or end of input.
pub async fn run_repl<N: Narrator, L: QuestLog>(
    engine: SessionEngine<N, L>,
    player: String,
) -> io::Result<()> {
    let player = PlayerId::new(player);

    println!("=== Rift DM ===");
    println!("Playing as: {player}");
    println!();
    print_commands();
    println!();
    println!("Enter commands (one per line):");
    println!();

    let mut stdout = io::stdout();
    let mut lines = io::stdin().lock().lines();

    while let Some(line) = lines.next() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "quit" || line == "exit" {
            println!("Goodbye!");
            break;
        }

        let Some(rest) = line.strip_prefix('!') else {
            println!("[STATUS] Prefix actions with !askdm, e.g. `!askdm {line}`");
            continue;
        };

        let (command, args) = match rest.split_once(char::is_whitespace) {
            Some((command, args)) => (command, args.trim()),
            None => (rest, ""),
        };

        match command {
            "newchar" => {
                if let Some(character) = run_character_wizard(&mut lines)? {
                    engine.insert_character(player.clone(), character.clone()).await;
                    print_character_created(&character);
                }
            }
            "createchar" => {
                let parts: Vec<&str> = args.split_whitespace().collect();
                if parts.len() < 3 {
                    println!("[ERROR] Usage: !createchar <name> <race> <class> [personality]");
                } else {
                    let personality = if parts.len() > 3 {
                        Some(parts[3..].join(" "))
                    } else {
                        None
                    };
                    let character = engine
                        .create_character(
                            player.clone(),
                            parts[0],
                            parts[1],
                            parts[2],
                            personality,
                        )
                        .await;
                    print_character_created(&character);
                }
            }
            "mychar" => match engine.character(&player).await {
                Some(character) => print_character_sheet(&character),
                None => {
                    println!("[ERROR] You haven't created a character yet. Use !createchar or !newchar.");
                }
            },
            "deletechar" => {
                if engine.delete_character(&player).await {
                    println!("[CHAR] Your character has been deleted.");
                } else {
                    println!("[ERROR] You don't have a character to delete.");
                }
            }
            "startparty" => {
                let members: Vec<String> = args.split_whitespace().map(String::from).collect();
                let roster = members.join(", ");
                match engine.start_party(members).await {
                    Ok(first) => {
                        println!("[PARTY] Party order set: {roster}");
                        println!("[PARTY] It's {first}'s turn!");
                    }
                    Err(e) => println!("[ERROR] {e}"),
                }
            }
            "nextturn" => match engine.next_turn().await {
                Ok(member) => println!("[PARTY] It's now {member}'s turn!"),
                Err(e) => println!("[ERROR] {e}"),
            },
            "addmember" => {
                if args.is_empty() {
                    println!("[ERROR] Usage: !addmember <name>");
                } else {
                    engine.add_member(args).await;
                    let roster = engine.party_members().await.join(", ");
                    println!("[PARTY] Added {args} to the party. Current order: {roster}");
                }
            }
            "endparty" => {
                engine.end_party().await;
                println!("[PARTY] Party turn tracking ended.");
            }
            "askdm" => {
                if args.is_empty() {
                    println!("[ERROR] Usage: !askdm <action>");
                } else {
                    print!("[PROCESSING]");
                    stdout.flush().ok();

                    let result = engine.handle_narrative_request(&player, args).await;
                    print!("\r            \r");
                    stdout.flush().ok();

                    match result {
                        Ok(response) => {
                            println!("[ROLL] You rolled a {} on your action.", response.roll.total);
                            println!("[DM]");
                            for para in response.narrative.split("\n\n") {
                                println!("{para}");
                            }
                            println!();
                        }
                        Err(e) => println!("[ERROR] {e}"),
                    }
                }
            }
            "helpme" => {
                println!("[HELP]");
                print_commands();
            }
            _ => {
                println!("[ERROR] Unknown command. Type !helpme for help.");
            }
        }

        stdout.flush().ok();
    }

    Ok(())
}

/// Prompt field-by-field for a new character.
///
/// Returns `None` if input ends or a required field is left blank.
fn run_character_wizard(
    lines: &mut io::Lines<io::StdinLock<'static>>,
) -> io::Result<Option<Character>> {
    let Some(name) = prompt_field(lines, "Name")? else {
        println!("[ERROR] Character creation cancelled: a name is required.");
        return Ok(None);
    };
    let Some(race) = prompt_field(lines, "Race")? else {
        println!("[ERROR] Character creation cancelled: a race is required.");
        return Ok(None);
    };
    let Some(class) = prompt_field(lines, "Class")? else {
        println!("[ERROR] Character creation cancelled: a class is required.");
        return Ok(None);
    };

    let mut character = Character::new(name, race, class);
    if let Some(personality) = prompt_field(lines, "Personality (optional)")? {
        character = character.with_personality(personality);
    }

    Ok(Some(character))
}

/// Read one trimmed line for a labeled field. Blank or end of input is `None`.
fn prompt_field(
    lines: &mut io::Lines<io::StdinLock<'static>>,
    label: &str,
) -> io::Result<Option<String>> {
    print!("{label}: ");
    io::stdout().flush()?;

    match lines.next() {
        Some(line) => {
            let value = line?.trim().to_string();
            Ok((!value.is_empty()).then_some(value))
        }
        None => Ok(None),
    }
}

fn print_character_created(character: &Character) {
    println!("[CHAR] Character created:");
    println!("  Name: {}", character.name);
    println!("  Race: {}", character.race);
    println!("  Class: {}", character.class);
    if let Some(personality) = &character.personality {
        println!("  Personality: {personality}");
    }
}

fn print_character_sheet(character: &Character) {
    println!("[CHAR]");
    println!("  Name: {}", character.name);
    println!("  Race: {}", character.race);
    println!("  Class: {}", character.class);
    println!(
        "  Stats: strength {} / dexterity {} / intelligence {}",
        character.stats.strength, character.stats.dexterity, character.stats.intelligence
    );
    let passives = if character.passives.is_empty() {
        "None".to_string()
    } else {
        character.passives.join(", ")
    };
    println!("  Passives: {passives}");
    if let Some(personality) = &character.personality {
        println!("  Personality: {personality}");
    }
}

fn print_commands() {
    println!("Commands:");
    println!("  !newchar                     - Create a character field by field");
    println!("  !createchar <name> <race> <class> [personality]");
    println!("  !mychar                      - Show your character sheet");
    println!("  !deletechar                  - Delete your character");
    println!("  !startparty <names...>       - Set the party order");
    println!("  !nextturn                    - Advance to the next turn");
    println!("  !addmember <name>            - Add a member to the party");
    println!("  !endparty                    - End party turn tracking");
    println!("  !askdm <action>              - Take an action; the DM replies");
    println!("  !helpme                      - Show this help");
    println!("  quit                         - Exit");
}
