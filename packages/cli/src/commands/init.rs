use crate::config::{Config, ModuleConfig, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

const BASE_VIEW: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<object-views>
  <form name="user-form" id="base-user-form" title="User">
    <panel name="main">
      <field name="name"/>
      <field name="email"/>
    </panel>
  </form>
</object-views>
"#;

const EXTENSION_VIEW: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<object-views>
  <form name="user-form" id="sale-user-form" extension="true">
    <extend target="panel[@name='main']/field[@name='email']">
      <insert position="after">
        <field name="salesTeam"/>
      </insert>
    </extend>
    <toolbar>
      <button name="showOrders" title="Orders"/>
    </toolbar>
  </form>
</object-views>
"#;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory holding one sub directory per module
    #[arg(short, long, default_value = "modules")]
    pub modules_dir: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!(
        "{}",
        "📝 Initializing ViewCompose project...".bright_blue().bold()
    );

    let mut modules = Vec::new();
    for (name, file, content) in [
        ("base", "User.xml", BASE_VIEW),
        ("sale", "User.xml", EXTENSION_VIEW),
    ] {
        let dir = format!("{}/{}/views", args.modules_dir, name);
        let path = PathBuf::from(cwd).join(&dir);
        if !path.exists() {
            fs::create_dir_all(&path)?;
            println!("  {} Created {}/", "✓".green(), dir);
        }

        let view_file = path.join(file);
        if !view_file.exists() {
            fs::write(&view_file, content)?;
            println!("  {} Created {}/{}", "✓".green(), dir, file);
        }

        modules.push(ModuleConfig {
            name: name.to_string(),
            dir,
        });
    }

    let config = Config {
        modules,
        ..Config::default()
    };

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Add views under {}/<module>/views", args.modules_dir);
    println!("  2. Run: viewcompose compose");
    println!("  3. Check output in {}/", config.out_dir);

    Ok(())
}
