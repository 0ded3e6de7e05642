//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::domain::{Application, InstanceRecord, InstanceSnapshot, InstanceState};
use crate::output::OutputContext;

/// Where and as whom the summary was fetched.
pub struct Target<'a> {
    pub org: &'a str,
    pub space: &'a str,
    pub username: &'a str,
}

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the settled application and its instance table.
    pub fn render_app_summary(
        &self,
        app: &Application,
        instances: &[InstanceRecord],
        start_command: Option<&str>,
        target: &Target<'_>,
    ) {
        if self.ctx.quiet {
            return;
        }

        println!();
        println!(
            "Showing health and status for app {} in org {} / space {} as {}...",
            self.ctx.entity(&app.name),
            self.ctx.entity(target.org),
            self.ctx.entity(target.space),
            self.ctx.entity(target.username),
        );
        println!();

        let snapshot = InstanceSnapshot::from_instances(instances);
        self.ctx.kv("requested state:", app.state.as_str());
        self.ctx
            .kv("instances:", &format!("{}/{}", snapshot.running, app.instances));
        self.ctx.kv("usage:", &format_usage(app));
        self.ctx.kv("routes:", &app.routes.join(", "));
        if let Some(cmd) = start_command {
            self.ctx.kv("start command:", cmd);
        }

        if instances.is_empty() {
            return;
        }
        println!();
        self.ctx.header(&format!(
            "{:<6}{:<11}{:<24}{}",
            "", "state", "since", "details"
        ));
        for (index, inst) in instances.iter().enumerate() {
            let row = instance_row(index, inst);
            match inst.state {
                InstanceState::Running => println!("{}", row.style(self.ctx.styles.success)),
                InstanceState::Crashed | InstanceState::Flapping => {
                    println!("{}", row.style(self.ctx.styles.error));
                }
                _ => println!("{row}"),
            }
        }
    }
}

/// `"256M x 2 instances"`.
fn format_usage(app: &Application) -> String {
    format!("{} x {} instances", format_megabytes(app.memory_mb), app.instances)
}

fn format_megabytes(mb: u64) -> String {
    if mb >= 1024 && mb % 1024 == 0 {
        format!("{}G", mb / 1024)
    } else {
        format!("{mb}M")
    }
}

fn instance_row(index: usize, inst: &InstanceRecord) -> String {
    let since = inst.since.map_or_else(String::new, |t| {
        t.format("%Y-%m-%d %I:%M:%S %p").to_string()
    });
    format!(
        "{:<6}{:<11}{:<24}{}",
        format!("#{index}"),
        inst.state.as_str(),
        since,
        inst.details.as_deref().unwrap_or("")
    )
    .trim_end()
    .to_string()
}
