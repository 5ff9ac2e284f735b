//! Command handlers shared by the one-shot CLI and the shell.

use std::io::Write;

use crate::balance::Dashboard;
use crate::config::Config;
use crate::desk::{Availability, Confirm, FrontDesk, Removal};
use crate::error::Result;
use crate::notify::{Phase, Toast};
use crate::record::RecordKind;
use crate::storage::KeyValueStore;
use crate::table::Table;
use crate::validation::{DonorForm, PatientForm};

use super::commands::{ConfigCommand, DonorCommand, ListArgs, OutputFormat, PatientCommand};
use super::Command;

/// Prompt shown before every record is deleted.
pub const RESET_PROMPT: &str = "Remove every donor and patient?";

/// A configured front desk plus the output it writes to.
#[derive(Debug)]
pub struct Session<S> {
    config: Config,
    desk: FrontDesk<S>,
}

impl<S: KeyValueStore> Session<S> {
    /// Create a session.
    pub fn new(config: Config, desk: FrontDesk<S>) -> Self {
        Self { config, desk }
    }

    /// The front desk.
    #[must_use]
    pub fn desk(&self) -> &FrontDesk<S> {
        &self.desk
    }

    /// Run one command, writing its view to `out`.
    ///
    /// `Command::Shell` is not handled here; the binary starts the shell.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or `out` cannot be written.
    pub fn execute(
        &mut self,
        command: Command,
        out: &mut dyn Write,
        confirm: &mut dyn Confirm,
    ) -> Result<()> {
        match command {
            Command::Dashboard(cmd) => self.show_dashboard(cmd.json, out),
            Command::Donor(cmd) => self.donor(cmd, out, confirm),
            Command::Patient(cmd) => self.patient(cmd, out),
            Command::Config(cmd) => self.config(cmd, out),
            Command::Reset { yes } => {
                if yes || confirm.confirm(RESET_PROMPT) {
                    self.desk.reset()?;
                    writeln!(out, "All records removed.")?;
                }
                Ok(())
            }
            Command::Shell => {
                writeln!(out, "Already in a shell.")?;
                Ok(())
            }
        }
    }

    fn donor(
        &mut self,
        cmd: DonorCommand,
        out: &mut dyn Write,
        confirm: &mut dyn Confirm,
    ) -> Result<()> {
        match cmd {
            DonorCommand::Add(fields) => {
                let mut form: DonorForm = fields.into();
                if let Some(donor) = self.desk.submit_donor(&mut form)? {
                    writeln!(out, "Donor {} recorded with id {}.", donor.name, donor.id)?;
                    self.show_stock_line(out)?;
                }
                Ok(())
            }
            DonorCommand::List(args) => self.list(RecordKind::Donor, &args, out),
            DonorCommand::Remove { id, yes } => {
                let outcome = if yes {
                    self.desk.remove_donor(id, &mut |_: &str| true)?
                } else {
                    self.desk.remove_donor(id, confirm)?
                };
                self.report_removal(id, outcome, out)
            }
        }
    }

    /// Finish a removal and print what happened.
    ///
    /// # Errors
    ///
    /// Returns an error if `out` cannot be written or the store fails.
    pub fn report_removal(&self, id: u64, outcome: Removal, out: &mut dyn Write) -> Result<()> {
        match outcome {
            Removal::Declined => writeln!(out, "Kept donor {id}.")?,
            Removal::Removed => {
                let table = self.desk.table(RecordKind::Donor, "")?;
                write_table(&table, self.config.tables.default_format, out)?;
                self.show_stock_line(out)?;
            }
            Removal::NotFound => writeln!(out, "No donor with id {id}.")?,
        }
        Ok(())
    }

    fn patient(&mut self, cmd: PatientCommand, out: &mut dyn Write) -> Result<()> {
        match cmd {
            PatientCommand::Check(fields) => {
                if let Some(outcome) = self.desk.check_availability(&fields.into())? {
                    write_availability(&outcome, out)?;
                }
                Ok(())
            }
            PatientCommand::Add(fields) => {
                let (check, intake) = fields.split();
                let Some(outcome) = self.desk.check_availability(&check)? else {
                    return Ok(());
                };
                write_availability(&outcome, out)?;
                if outcome.is_available() {
                    let mut form = intake.apply(self.desk.patient_form());
                    self.submit_patient(&mut form, out)?;
                }
                Ok(())
            }
            PatientCommand::Submit(intake) => {
                let mut form = intake.apply(self.desk.patient_form());
                self.submit_patient(&mut form, out)
            }
            PatientCommand::List(args) => self.list(RecordKind::Patient, &args, out),
        }
    }

    fn submit_patient(&mut self, form: &mut PatientForm, out: &mut dyn Write) -> Result<()> {
        if let Some(patient) = self.desk.submit_patient(form)? {
            writeln!(
                out,
                "Patient {} recorded with id {} ({} x{} at {}).",
                patient.name, patient.id, patient.blood_group, patient.units, patient.hospital
            )?;
            self.show_stock_line(out)?;
        }
        Ok(())
    }

    fn list(&self, kind: RecordKind, args: &ListArgs, out: &mut dyn Write) -> Result<()> {
        let table = self.desk.table(kind, &args.search)?;
        let format = args.format.unwrap_or(self.config.tables.default_format);
        write_table(&table, format, out)
    }

    fn show_dashboard(&self, json: bool, out: &mut dyn Write) -> Result<()> {
        let dashboard = self.desk.dashboard()?;
        if json {
            writeln!(out, "{}", serde_json::to_string_pretty(&dashboard)?)?;
        } else {
            write_dashboard(&dashboard, out)?;
        }
        Ok(())
    }

    fn show_stock_line(&self, out: &mut dyn Write) -> Result<()> {
        let dashboard = self.desk.dashboard()?;
        let tiles: Vec<String> = dashboard
            .groups
            .iter()
            .map(|g| format!("{} {}", g.group, g.units))
            .collect();
        writeln!(out, "Stock: {}", tiles.join(" | "))?;
        Ok(())
    }

    fn config(&self, cmd: ConfigCommand, out: &mut dyn Write) -> Result<()> {
        match cmd {
            ConfigCommand::Show { json } => {
                if json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&self.config)?)?;
                } else {
                    writeln!(out, "Current Configuration")?;
                    writeln!(out, "=====================")?;
                    writeln!(out)?;
                    writeln!(out, "[Storage]")?;
                    writeln!(
                        out,
                        "  Database path:      {}",
                        self.config.database_path().display()
                    )?;
                    writeln!(out)?;
                    writeln!(out, "[Notifications]")?;
                    writeln!(
                        out,
                        "  Display (ms):       {}",
                        self.config.notifications.display_ms
                    )?;
                    writeln!(
                        out,
                        "  Fade (ms):          {}",
                        self.config.notifications.fade_ms
                    )?;
                    writeln!(out)?;
                    writeln!(out, "[Tables]")?;
                    writeln!(
                        out,
                        "  Default format:     {:?}",
                        self.config.tables.default_format
                    )?;
                }
            }
            ConfigCommand::Path => {
                writeln!(out, "{}", Config::default_config_path().display())?;
            }
            ConfigCommand::Validate { file } => {
                let path = file.unwrap_or_else(Config::default_config_path);
                writeln!(out, "Validating configuration: {}", path.display())?;
                match Config::load_from(Some(path)) {
                    Ok(_) => writeln!(out, "Configuration is valid.")?,
                    Err(e) => writeln!(out, "Configuration error: {e}")?,
                }
            }
        }
        Ok(())
    }
}

fn write_availability(outcome: &Availability, out: &mut dyn Write) -> Result<()> {
    let (request, balance, verdict) = match outcome {
        Availability::Available { request, balance } => (request, balance, "available"),
        Availability::Shortfall { request, balance } => (request, balance, "short"),
    };
    writeln!(
        out,
        "{}: requested {}, on hand {} ({verdict})",
        request.group,
        request.units,
        (*balance).max(0)
    )?;
    Ok(())
}

fn write_dashboard(dashboard: &Dashboard, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Blood stock")?;
    writeln!(out, "-----------")?;
    for tile in &dashboard.groups {
        writeln!(out, "  {:<4}{:>6}", tile.group.label(), tile.units)?;
    }
    writeln!(out)?;
    writeln!(out, "Total units:     {}", dashboard.total_units)?;
    writeln!(out, "Total donors:    {}", dashboard.total_donors)?;
    writeln!(out, "Total patients:  {}", dashboard.total_patients)?;
    writeln!(out, "Most stocked:    {}", dashboard.most_stocked_label())?;
    Ok(())
}

fn write_table(table: &Table, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Plain => write!(out, "{}", table.to_plain())?,
        OutputFormat::Table => {
            write!(out, "{}", table.to_aligned())?;
            writeln!(out, "({} shown)", table.len())?;
        }
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(table)?)?,
    }
    Ok(())
}

/// Print toasts, oldest first.
///
/// # Errors
///
/// Returns an error if `out` cannot be written.
pub fn print_toasts(toasts: &[Toast], out: &mut dyn Write) -> Result<()> {
    for toast in toasts {
        let fading = if toast.phase == Phase::Fading {
            " (fading)"
        } else {
            ""
        };
        writeln!(out, "[{}] {}{fading}", toast.severity, toast.message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CheckFields, DashboardCommand, DonorFields, IntakeFields, PatientFields};
    use crate::notify::Notifier;
    use crate::storage::MemoryStore;

    fn session() -> Session<MemoryStore> {
        Session::new(
            Config::default(),
            FrontDesk::new(MemoryStore::new(), Notifier::default()),
        )
    }

    fn run(session: &mut Session<MemoryStore>, command: Command) -> String {
        let mut out = Vec::new();
        let mut refuse = |_: &str| false;
        session.execute(command, &mut out, &mut refuse).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn add_donor(group: &str, units: &str) -> Command {
        Command::Donor(DonorCommand::Add(DonorFields {
            name: "Ada".to_string(),
            blood_group: group.to_string(),
            units: units.to_string(),
            contact: String::new(),
        }))
    }

    fn add_patient(group: &str, units: &str) -> Command {
        Command::Patient(PatientCommand::Add(PatientFields {
            request: CheckFields {
                blood_group: group.to_string(),
                units: units.to_string(),
            },
            name: "Pat".to_string(),
            contact: String::new(),
            hospital: "General".to_string(),
        }))
    }

    fn list(kind: RecordKind, format: OutputFormat) -> Command {
        let args = ListArgs {
            search: String::new(),
            format: Some(format),
        };
        match kind {
            RecordKind::Donor => Command::Donor(DonorCommand::List(args)),
            RecordKind::Patient => Command::Patient(PatientCommand::List(args)),
        }
    }

    #[test]
    fn test_dashboard_text() {
        let mut session = session();
        run(&mut session, add_donor("A+", "5"));
        let text = run(&mut session, Command::Dashboard(DashboardCommand { json: false }));
        assert!(text.contains("Total units:     5"));
        assert!(text.contains("Most stocked:    A+ (5)"));
    }

    #[test]
    fn test_dashboard_json() {
        let mut session = session();
        let text = run(&mut session, Command::Dashboard(DashboardCommand { json: true }));
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["total_units"], 0);
        assert!(json["most_stocked"].is_null());
    }

    #[test]
    fn test_add_donor_prints_stock() {
        let mut session = session();
        let text = run(&mut session, add_donor("O-", "2"));
        assert!(text.contains("Donor Ada recorded"));
        assert!(text.contains("O- 2"));
    }

    #[test]
    fn test_invalid_donor_prints_nothing_but_toasts() {
        let mut session = session();
        let text = run(&mut session, add_donor("", "2"));
        assert!(text.is_empty());
        let toasts = session.desk().notifier().drain();
        assert_eq!(toasts[0].message, "Select blood group.");
    }

    #[test]
    fn test_patient_add_runs_check_then_intake() {
        let mut session = session();
        run(&mut session, add_donor("A+", "5"));
        let text = run(&mut session, add_patient("A+", "3"));
        assert!(text.contains("(available)"));
        assert!(text.contains("Patient Pat recorded"));
        assert_eq!(session.desk().store().patients().unwrap().len(), 1);

        let text = run(&mut session, add_patient("A+", "3"));
        assert!(text.contains("on hand 2 (short)"));
        assert_eq!(session.desk().store().patients().unwrap().len(), 1);
    }

    #[test]
    fn test_patient_submit_without_check_is_rejected() {
        let mut session = session();
        let intake = IntakeFields {
            name: "Pat".to_string(),
            contact: String::new(),
            hospital: "General".to_string(),
            blood_group: Some("A+".to_string()),
            units: Some("1".to_string()),
        };
        run(&mut session, Command::Patient(PatientCommand::Submit(intake)));
        assert!(session.desk().store().patients().unwrap().is_empty());
        let toasts = session.desk().notifier().drain();
        assert_eq!(toasts[0].message, "Check availability first.");
    }

    #[test]
    fn test_check_prints_outcome() {
        let mut session = session();
        let text = run(
            &mut session,
            Command::Patient(PatientCommand::Check(CheckFields {
                blood_group: "B+".to_string(),
                units: "1".to_string(),
            })),
        );
        assert_eq!(text, "B+: requested 1, on hand 0 (short)\n");
    }

    #[test]
    fn test_remove_requires_confirmation() {
        let mut session = session();
        run(&mut session, add_donor("A+", "5"));
        let id = session.desk().store().donors().unwrap()[0].id;

        let text = run(
            &mut session,
            Command::Donor(DonorCommand::Remove { id, yes: false }),
        );
        assert!(text.contains("Kept donor"));
        assert_eq!(session.desk().store().donors().unwrap().len(), 1);

        let text = run(
            &mut session,
            Command::Donor(DonorCommand::Remove { id, yes: true }),
        );
        assert!(session.desk().store().donors().unwrap().is_empty());
        assert!(text.contains("(0 shown)"), "donor table is re-rendered: {text}");
        assert!(text.contains("Stock: A+ 0"));
    }

    #[test]
    fn test_list_formats() {
        let mut session = session();
        run(&mut session, add_donor("AB+", "1"));

        let plain = run(&mut session, list(RecordKind::Donor, OutputFormat::Plain));
        assert!(plain.starts_with("Ada\tAB+\t1\t\tremove "));

        let table = run(&mut session, list(RecordKind::Donor, OutputFormat::Table));
        assert!(table.contains("(1 shown)"));

        let json = run(&mut session, list(RecordKind::Patient, OutputFormat::Json));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["rows"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_reset_needs_confirmation() {
        let mut session = session();
        run(&mut session, add_donor("A+", "5"));
        run(&mut session, Command::Reset { yes: false });
        assert_eq!(session.desk().store().donors().unwrap().len(), 1);
        let text = run(&mut session, Command::Reset { yes: true });
        assert!(text.contains("All records removed."));
        assert!(session.desk().store().donors().unwrap().is_empty());
    }

    #[test]
    fn test_config_show() {
        let mut session = session();
        let text = run(&mut session, Command::Config(ConfigCommand::Show { json: false }));
        assert!(text.contains("[Notifications]"));
        assert!(text.contains("1600"));
    }

    #[test]
    fn test_print_toasts() {
        let toasts = vec![
            Toast {
                id: 1,
                message: "Donor removed.".to_string(),
                severity: crate::notify::Severity::Warn,
                phase: Phase::Visible,
            },
            Toast {
                id: 2,
                message: "Blood available!".to_string(),
                severity: crate::notify::Severity::Success,
                phase: Phase::Fading,
            },
        ];
        let mut out = Vec::new();
        print_toasts(&toasts, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[warn] Donor removed.\n[success] Blood available! (fading)\n"
        );
    }
}
