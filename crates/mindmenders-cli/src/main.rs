use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use mindmenders_config::{expand_tilde, Config, ConfigManager};
use mindmenders_core::{ChatMessage, ChatRole, MoodType, CRISIS_NOTICE_BODY, CRISIS_NOTICE_TITLE};
use mindmenders_llm::{GeminiProvider, ProviderConfig};
use mindmenders_observability::{LogManager, LoggingConfig};
use mindmenders_session::{
    App, AuthForm, AuthState, ChatEvent, MoodCheckIn, SyncState, Tab, TurnOutcome, Workspace,
    CONFIRMATION_SENT,
};
use mindmenders_store::{SessionCache, SupabaseStore};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

mod config_cmd;
mod exercises;

#[derive(Parser)]
#[command(name = "mindmenders")]
#[command(about = "MindMenders: a quiet corner for your mind, in the terminal")]
#[command(version)]
struct Cli {
    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// Config file path
    #[arg(long, env = "MINDMENDERS_CONFIG", default_value = "~/.mindmenders/config.json")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 登录
    Login {
        #[arg(long, short)]
        email: Option<String>,
        #[arg(long, env = "MINDMENDERS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// 注册新账号
    Register {
        #[arg(long, short)]
        name: Option<String>,
        #[arg(long, short)]
        email: Option<String>,
        #[arg(long, env = "MINDMENDERS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// 退出登录
    Logout,
    /// 显示当前登录用户
    Whoami,
    /// 首页概览
    Dashboard,
    /// 与 AI 伙伴交互式聊天
    Chat,
    /// 心情打卡
    Mood(MoodArgs),
    /// 呼吸练习
    Breathe {
        /// 循环次数
        #[arg(long, short, default_value_t = 4)]
        cycles: u32,
        /// 节律: box (4-4-4-4) 或 relaxed (4-4-4-2)
        #[arg(long, short, default_value = "box")]
        pattern: String,
    },
    /// 5-4-3-2-1 五感着陆练习
    Ground,
    /// 记录最多三件感恩的事
    Gratitude {
        #[arg(required = true, num_args = 1..=3)]
        items: Vec<String>,
    },
    /// 偏好设置
    Settings(SettingsArgs),
    /// 配置管理命令
    Config(ConfigArgs),
}

#[derive(Args, Clone)]
struct MoodArgs {
    #[command(subcommand)]
    command: MoodCommands,
}

#[derive(Subcommand, Clone)]
enum MoodCommands {
    /// 记录当前心情
    Log {
        /// happy, sad, anxious, stressed 或 calm
        mood: String,
        #[arg(long, short)]
        note: Option<String>,
    },
    /// 查看心情历史
    History {
        #[arg(long, short, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Args, Clone)]
struct SettingsArgs {
    #[command(subcommand)]
    command: Option<SettingsCommands>,
}

#[derive(Subcommand, Clone)]
enum SettingsCommands {
    /// 显示所有开关
    Show,
    /// 翻转一个开关 (如: dark_mode, privacy-mode)
    Toggle { key: String },
}

#[derive(Args, Clone)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// 获取配置值
    Get {
        /// 配置键 (如: store.url, llm.model)
        key: String,
    },
    /// 设置配置值
    Set {
        /// 配置键 (如: store.url, llm.model)
        key: String,
        /// 配置值
        value: String,
    },
    /// 初始化默认配置
    Init {
        /// 强制覆盖已有配置
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// 显示当前配置
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 展开配置文件路径
    let config_path = expand_tilde(&cli.config).unwrap_or_else(|| PathBuf::from(&cli.config));

    if cli.debug {
        eprintln!("{}", "[DEBUG] Debug mode enabled".dimmed());
        eprintln!("{}", format!("[DEBUG] Config path: {:?}", config_path).dimmed());
    }

    if let Commands::Config(args) = cli.command {
        return config_cmd::handle(args, &config_path).await;
    }

    let manager = ConfigManager::load(&config_path).await?;
    let config = manager.snapshot().await;
    let _logs = init_logging(&config, cli.debug);

    match cli.command {
        Commands::Login { email, password } => {
            let email = email.map_or_else(|| prompt("Email:"), Ok)?;
            let password = password.map_or_else(|| prompt("Password:"), Ok)?;
            let app = connect(&config)?;
            report_auth(app.sign_in(&AuthForm::login(email, password)).await)
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let name = name.map_or_else(|| prompt("Name:"), Ok)?;
            let email = email.map_or_else(|| prompt("Email:"), Ok)?;
            let password = password.map_or_else(|| prompt("Password:"), Ok)?;
            let app = connect(&config)?;
            report_auth(app.register(&AuthForm::registration(name, email, password)).await)
        }
        Commands::Logout => {
            let app = connect(&config)?;
            app.initialize().await;
            app.sign_out().await;
            println!("{}", "👋 Signed out. Take care of yourself.".cyan());
            Ok(())
        }
        Commands::Whoami => {
            let app = connect(&config)?;
            match app.initialize().await {
                AuthState::Authenticated(user) => {
                    println!("{}", user.name.green().bold());
                    println!("{}", user.email.dimmed());
                }
                state => {
                    println!("{}", "Not signed in".yellow());
                    if let Some(notice) = state.notice() {
                        println!("{}", notice.dimmed());
                    }
                }
            }
            Ok(())
        }
        Commands::Dashboard => {
            let app = connect(&config)?;
            let workspace = open(&app, Tab::Dashboard).await?;
            show_dashboard(&workspace)
        }
        Commands::Chat => {
            let app = connect(&config)?;
            let workspace = open(&app, Tab::Chat).await?;
            run_interactive_chat(&workspace, cli.debug).await
        }
        Commands::Mood(args) => {
            let app = connect(&config)?;
            match args.command {
                MoodCommands::Log { mood, note } => {
                    let mood: MoodType = mood.parse()?;
                    let workspace = open(&app, Tab::MoodCheck).await?;
                    log_mood(&workspace, mood, note).await
                }
                MoodCommands::History { limit } => {
                    let workspace = open(&app, Tab::History).await?;
                    show_mood_history(&workspace, limit)
                }
            }
        }
        Commands::Breathe { cycles, pattern } => exercises::breathe(cycles, &pattern).await,
        Commands::Ground => {
            let app = connect(&config)?;
            let workspace = open(&app, Tab::Exercises).await?;
            exercises::ground(workspace.user())
        }
        Commands::Gratitude { items } => {
            let app = connect(&config)?;
            let workspace = open(&app, Tab::Exercises).await?;
            exercises::gratitude(workspace.user(), items)
        }
        Commands::Settings(args) => exercises::settings(args.command),
        Commands::Config(args) => config_cmd::handle(args, &config_path).await,
    }
}

/// 日志只写文件；debug 模式下同时输出到 stderr
fn init_logging(config: &Config, debug: bool) -> Option<LogManager> {
    let mut logging = LoggingConfig::from(&config.logging).with_console(debug);
    if debug {
        logging = logging.with_level("debug");
    }

    match LogManager::init(logging) {
        Ok(manager) => Some(manager),
        Err(e) => {
            eprintln!("{}", format!("⚠️  Logging disabled: {}", e).yellow());
            None
        }
    }
}

/// 根据配置创建远端存储和 AI 客户端
fn connect(config: &Config) -> anyhow::Result<App> {
    let anon_key = config.store.auth.get_api_key().ok_or_else(|| {
        anyhow!(
            "Store anon key not found. Set {} in your environment.",
            config.store.auth.env_var().unwrap_or("SUPABASE_ANON_KEY")
        )
    })?;

    let cache = config
        .store
        .session_file
        .as_deref()
        .and_then(expand_tilde)
        .map(SessionCache::new)
        .or_else(SessionCache::default_location);

    let mut store = SupabaseStore::with_timeout(
        &config.store.url,
        anon_key,
        Duration::from_secs(config.store.timeout_seconds),
    )?;
    if let Some(cache) = cache {
        store = store.with_session_cache(cache);
    }

    let mut provider_config = ProviderConfig::new("gemini", &config.llm.base_url)
        .with_model(&config.llm.model)
        .with_timeout(Duration::from_secs(config.llm.timeout_seconds));
    match config.llm.auth.get_api_key() {
        Some(key) => provider_config = provider_config.with_api_key(key),
        None => warn!("No LLM API key configured, chat replies will use the fallback message"),
    }
    let client = GeminiProvider::with_config(provider_config)?;

    Ok(App::new(Arc::new(store), Arc::new(client)))
}

/// 恢复会话并打开标签页
async fn open(app: &App, tab: Tab) -> anyhow::Result<Arc<Workspace>> {
    let state = app.initialize().await;
    if let Some(notice) = state.notice() {
        eprintln!("{}", notice.yellow());
    }

    app.navigate(tab)
        .await
        .map_err(|e| anyhow!("{} Run `mindmenders login` first.", e))
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{} ", label.cyan().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

fn report_auth(state: AuthState) -> anyhow::Result<()> {
    match state {
        AuthState::Authenticated(user) => {
            println!(
                "{}",
                format!("✅ Welcome to your sanctuary, {}.", user.first_name()).green()
            );
        }
        AuthState::PendingConfirmation { email } => {
            println!("{}", format!("📬 {}", CONFIRMATION_SENT).yellow());
            println!("{}", format!("Sent to {}", email).dimmed());
        }
        AuthState::SignedOut { notice } => {
            let notice = notice.unwrap_or_else(|| "Sign in failed".to_string());
            println!("{}", format!("❌ {}", notice).red());
            std::process::exit(1);
        }
        AuthState::Loading => {}
    }
    Ok(())
}

fn show_dashboard(workspace: &Workspace) -> anyhow::Result<()> {
    let user = workspace.user();
    let privacy = exercises::load_settings()?.privacy_mode;

    println!(
        "{}",
        format!("🌿 Welcome back, {}", user.first_name()).cyan().bold()
    );
    println!();

    match workspace.journal.latest() {
        Some(entry) => {
            println!(
                "Latest check-in: {} {} {}",
                entry.mood.emoji(),
                entry.mood.to_string().bold(),
                entry.created_at.format("(%b %d, %H:%M)").to_string().dimmed()
            );
            if entry.has_note() && !privacy {
                println!("  {}", format!("\"{}\"", entry.note).italic());
            }
        }
        None => println!("{}", "No check-ins yet. How are you feeling today?".dimmed()),
    }

    let chats = workspace.chat.messages().len();
    println!(
        "{}",
        format!(
            "{} check-ins · {} companion messages",
            workspace.journal.entries().len(),
            chats
        )
        .dimmed()
    );
    Ok(())
}

async fn log_mood(workspace: &Workspace, mood: MoodType, note: Option<String>) -> anyhow::Result<()> {
    let check_in = MoodCheckIn::new();
    check_in.select(mood);
    if let Some(note) = note {
        check_in.set_note(note);
    }

    match check_in.submit(&workspace.journal).await {
        Ok(entry) => {
            println!(
                "{}",
                format!("{} Logged {} mood. Thank you for checking in.", entry.mood.emoji(), entry.mood)
                    .green()
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", format!("❌ {}", e).red());
            std::process::exit(1);
        }
    }
}

fn show_mood_history(workspace: &Workspace, limit: usize) -> anyhow::Result<()> {
    let entries = workspace.journal.entries();
    if entries.is_empty() {
        println!("{}", "No check-ins yet. Try `mindmenders mood log calm`.".dimmed());
        return Ok(());
    }

    let privacy = exercises::load_settings()?.privacy_mode;
    println!("{}", "📖 Mood History".cyan().bold());
    println!("{}", "─".repeat(50).dimmed());

    for entry in entries.iter().take(limit) {
        let note = if !entry.has_note() {
            String::new()
        } else if privacy {
            "•••".to_string()
        } else {
            entry.note.clone()
        };
        println!(
            "{}  {} {:<9} {}",
            entry.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            entry.mood.emoji(),
            entry.mood.as_str(),
            note
        );
    }
    Ok(())
}

fn print_message(message: &ChatMessage) {
    match message.role {
        ChatRole::User => println!("{} {}", "You:".cyan().bold(), message.content),
        ChatRole::Ai => println!("{} {}", "MindMender:".green().bold(), message.content),
    }
}

fn print_crisis_notice() {
    println!();
    println!("{}", format!("💛 {}", CRISIS_NOTICE_TITLE).red().bold());
    println!("{}", CRISIS_NOTICE_BODY.red());
    println!();
}

const CRISIS_REMINDER: &str = "💛 Support is here for you. Type /dismiss to hide this notice.";

#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Exit,
    Dismiss,
    Empty,
    Message(&'a str),
}

fn parse_chat_input(line: &str) -> ChatInput<'_> {
    let input = line.trim();
    if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
        ChatInput::Exit
    } else if input.eq_ignore_ascii_case("/dismiss") {
        ChatInput::Dismiss
    } else if input.is_empty() {
        ChatInput::Empty
    } else {
        ChatInput::Message(input)
    }
}

async fn run_interactive_chat(workspace: &Workspace, debug: bool) -> anyhow::Result<()> {
    let chat = &workspace.chat;
    let mut events = chat.subscribe();

    println!("{}", "🌿 MindMenders AI Companion".cyan().bold());
    println!("{}", "Type 'exit' or 'quit' to leave".dimmed());
    println!();

    let history = chat.messages();
    for entry in history.iter().skip(history.len().saturating_sub(6)) {
        print_message(&entry.message);
    }
    if !history.is_empty() {
        println!("{}", "─".repeat(50).dimmed());
    }

    loop {
        // 提示一直保留，直到用户主动关闭
        if chat.crisis_notice_active() {
            println!("{}", CRISIS_REMINDER.red().dimmed());
        }
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let input = match parse_chat_input(&line) {
            ChatInput::Exit => {
                println!("{}", "👋 Goodbye. Be gentle with yourself.".cyan());
                break;
            }
            ChatInput::Dismiss => {
                chat.dismiss_crisis_notice();
                continue;
            }
            ChatInput::Empty => continue,
            ChatInput::Message(input) => input,
        };

        println!("{}", "MindMender is reflecting...".dimmed());
        let outcome = chat.send(input).await;
        if debug {
            eprintln!("{}", format!("[DEBUG] Turn outcome: {:?}", outcome).dimmed());
        }
        if outcome == TurnOutcome::Ignored {
            continue;
        }

        while let Ok(event) = events.try_recv() {
            match event {
                ChatEvent::CrisisNotice => print_crisis_notice(),
                ChatEvent::Appended(entry) if entry.message.role == ChatRole::Ai => {
                    print_message(&entry.message);
                }
                ChatEvent::Reconciled { entry, .. } if entry.sync == SyncState::LocalOnly => {
                    println!(
                        "{}",
                        "⚠️  Your message could not be saved and is only kept for this session."
                            .yellow()
                    );
                }
                _ => {}
            }
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_mood_log() {
        let cli = Cli::try_parse_from(["mindmenders", "mood", "log", "calm", "--note", "tea"]).unwrap();
        match cli.command {
            Commands::Mood(MoodArgs {
                command: MoodCommands::Log { mood, note },
            }) => {
                assert_eq!(mood, "calm");
                assert_eq!(note.as_deref(), Some("tea"));
            }
            _ => panic!("expected mood log"),
        }
    }

    #[test]
    fn test_gratitude_accepts_at_most_three_items() {
        assert!(Cli::try_parse_from(["mindmenders", "gratitude", "a", "b", "c"]).is_ok());
        assert!(Cli::try_parse_from(["mindmenders", "gratitude", "a", "b", "c", "d"]).is_err());
        assert!(Cli::try_parse_from(["mindmenders", "gratitude"]).is_err());
    }

    #[test]
    fn test_breathe_defaults() {
        let cli = Cli::try_parse_from(["mindmenders", "breathe"]).unwrap();
        match cli.command {
            Commands::Breathe { cycles, pattern } => {
                assert_eq!(cycles, 4);
                assert_eq!(pattern, "box");
            }
            _ => panic!("expected breathe"),
        }
    }

    #[test]
    fn test_parse_chat_input() {
        assert_eq!(parse_chat_input("  quit\n"), ChatInput::Exit);
        assert_eq!(parse_chat_input("EXIT"), ChatInput::Exit);
        assert_eq!(parse_chat_input("/dismiss\n"), ChatInput::Dismiss);
        assert_eq!(parse_chat_input(" \n"), ChatInput::Empty);
        assert_eq!(parse_chat_input(" I feel low \n"), ChatInput::Message("I feel low"));
    }
}
