//! Replace command: search, plan, review, apply

use super::open_state;
use crate::config::CliSettings;
use crate::output::display::{print_planned_edit, print_preview};
use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use docshift_core::search::total_matches;
use docshift_core::{
    Approval, DocumentId, ReplaceOptions, ReplacementPreview, ReviewGate, ReviewOutcome,
    SearchMode,
};

#[derive(Debug, Clone)]
pub struct ReplaceArgs {
    pub query: String,
    pub replacement: String,
    pub smart_search: bool,
    pub smart: bool,
    pub preserve_structure: bool,
    pub preserve_tense: bool,
    pub yes: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy)]
enum ReviewChoice {
    Approve,
    Reject,
    Edit,
    ApproveDocument,
    RejectDocument,
    ApproveRemaining,
    Finish,
    Cancel,
}

const CHOICES: [(ReviewChoice, &str); 8] = [
    (ReviewChoice::Approve, "Approve"),
    (ReviewChoice::Reject, "Reject"),
    (ReviewChoice::Edit, "Edit replacement"),
    (ReviewChoice::ApproveDocument, "Approve the rest of this document"),
    (ReviewChoice::RejectDocument, "Reject the rest of this document"),
    (ReviewChoice::ApproveRemaining, "Approve everything remaining"),
    (ReviewChoice::Finish, "Finish (apply what is approved)"),
    (ReviewChoice::Cancel, "Cancel (apply nothing)"),
];

pub async fn replace_command(settings: &CliSettings, args: &ReplaceArgs) -> Result<()> {
    let mut state = open_state(settings).await?;

    let mode = if args.smart_search {
        SearchMode::Semantic
    } else {
        SearchMode::Literal
    };
    let results = state.search(&args.query, mode).await?;
    if results.is_empty() {
        println!("No matches found for \"{}\"", args.query);
        return Ok(());
    }
    println!(
        "Found {} matches in {} documents",
        total_matches(results),
        results.len()
    );

    let options = ReplaceOptions {
        smart: args.smart,
        preserve_structure: args.preserve_structure,
        preserve_tense: args.preserve_tense,
    };
    state.generate_previews(&args.replacement, options).await?;

    if args.dry_run {
        for preview in state.review().previews() {
            print_preview(preview);
        }
        state.review_mut().reject_all()?;
        state.close_review().await?;
        println!("Dry run: no changes were written");
        return Ok(());
    }

    if args.yes {
        state.review_mut().approve_all()?;
    } else {
        if !console::Term::stdout().is_term() {
            state.cancel_review().await?;
            bail!("Interactive review needs a terminal; pass --yes to apply every replacement or --dry-run to preview them");
        }
        if !interactive_review(state.review_mut())? {
            state.cancel_review().await?;
            println!("Review cancelled; no changes were written");
            return Ok(());
        }
        let (approved, rejected, pending) = state.review().tally();
        println!(
            "{} approved, {} rejected, {} left pending",
            approved, rejected, pending
        );
    }

    let outcome = state.close_review().await?;
    report(&outcome);
    Ok(())
}

fn report(outcome: &ReviewOutcome) {
    for name in &outcome.skipped_documents {
        eprintln!(
            "{} {} changed since it was searched; its replacements were not applied",
            "warning:".yellow(),
            name
        );
    }

    if outcome.changed() {
        println!(
            "{} Applied {} replacements to {} documents",
            "✓".green(),
            outcome.edits_applied,
            outcome.documents_updated
        );
    } else {
        println!("No changes applied");
    }
}

fn pending_ids(previews: &[ReplacementPreview], document: Option<DocumentId>) -> Vec<String> {
    previews
        .iter()
        .filter(|p| document.is_none() || document == Some(p.document_id))
        .flat_map(|p| p.matches.iter())
        .filter(|m| m.approval == Approval::Pending)
        .map(|m| m.id.clone())
        .collect()
}

fn decide_pending(
    gate: &mut ReviewGate,
    document: Option<DocumentId>,
    approval: Approval,
) -> Result<()> {
    for id in pending_ids(gate.previews(), document) {
        gate.set_approval(&id, approval)?;
    }
    Ok(())
}

/// Walk every pending match with the user. Returns false when the user cancels.
fn interactive_review(gate: &mut ReviewGate) -> Result<bool> {
    let theme = ColorfulTheme::default();
    let labels: Vec<&str> = CHOICES.iter().map(|(_, label)| *label).collect();
    let total = gate.previews().len();
    gate.go_to(0);

    loop {
        let Some(preview) = gate.current().cloned() else {
            return Ok(true);
        };
        let position = gate.cursor().unwrap_or(0) + 1;
        println!();
        println!(
            "{} [{}/{}]",
            preview.document_name.bold(),
            position,
            total
        );

        for match_id in preview.matches.iter().map(|m| m.id.clone()) {
            loop {
                let Some(current) = gate.current().cloned() else {
                    break;
                };
                let Some(m) = current.matches.iter().find(|m| m.id == match_id) else {
                    break;
                };
                if m.approval != Approval::Pending {
                    break;
                }

                print_planned_edit(&current, m);
                let selection = Select::with_theme(&theme)
                    .items(&labels)
                    .default(0)
                    .interact()?;

                match CHOICES[selection].0 {
                    ReviewChoice::Approve => gate.approve(&match_id)?,
                    ReviewChoice::Reject => gate.reject(&match_id)?,
                    ReviewChoice::Edit => {
                        let text: String = Input::with_theme(&theme)
                            .with_prompt("Replacement")
                            .with_initial_text(m.effective_replacement().unwrap_or_default())
                            .interact_text()?;
                        if let Err(e) = gate.edit_replacement(&match_id, &text) {
                            eprintln!("{} {}", "error:".red(), e);
                        }
                    }
                    ReviewChoice::ApproveDocument => {
                        decide_pending(gate, Some(preview.document_id), Approval::Approved)?
                    }
                    ReviewChoice::RejectDocument => {
                        decide_pending(gate, Some(preview.document_id), Approval::Rejected)?
                    }
                    ReviewChoice::ApproveRemaining => {
                        decide_pending(gate, None, Approval::Approved)?;
                        return Ok(true);
                    }
                    ReviewChoice::Finish => return Ok(true),
                    ReviewChoice::Cancel => return Ok(false),
                }
            }
        }

        if position >= total {
            return Ok(true);
        }
        gate.next();
    }
}
