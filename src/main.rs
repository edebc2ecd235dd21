// 宝可梦人气锦标赛命令行入口
// 开发心理：启动流程只做三件事：解析参数、加载配置、选择数据源，其余交给库
// 交互：每轮输入 1 或 2 选出更喜欢的一只，r 重置，q 退出

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use pokemon_tournament::{
    utils, CategoryId, ConfigManager, CreatureRecord, DataFetcher, MirrorFetcher, PokemonType,
    RankedEntry, RoundOutcome, TournamentConfig, TournamentContext, TournamentState,
};

#[derive(Debug, Parser)]
#[command(name = "pokemon-tournament", version, about = "按属性进行的宝可梦人气淘汰赛")]
struct Cli {
    /// 配置文件路径 (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 使用本地镜像目录代替在线API
    #[arg(long, global = true)]
    mirror: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 列出全部18种属性
    Types,
    /// 打印某个属性的花名册和进化线
    Roster { category: String },
    /// 开始某个属性的交互式锦标赛
    Play {
        category: String,
        /// 固定随机种子，便于复盘
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose);

    info!("🎮 启动宝可梦锦标赛 v{}", pokemon_tournament::VERSION);

    if let Err(e) = run(cli).await {
        error!("运行失败: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ConfigManager::load(cli.config.as_deref()).context("加载配置失败")?;

    match cli.command {
        Command::Types => {
            print_types();
            Ok(())
        }
        Command::Roster { category } => {
            let category: CategoryId = category.parse()?;
            let ctx = TournamentContext::new(build_fetcher(cli.mirror, &config)?, config)?;
            let roster = ctx.build_roster(&category).await;
            print_roster(&category, &roster);
            Ok(())
        }
        Command::Play { category, seed } => {
            let category: CategoryId = category.parse()?;
            if seed.is_some() {
                config.tournament.seed = seed;
            }
            let ctx = TournamentContext::new(build_fetcher(cli.mirror, &config)?, config)?;
            play(&ctx, &category).await
        }
    }
}

fn build_fetcher(mirror: Option<PathBuf>, config: &TournamentConfig) -> anyhow::Result<Arc<dyn DataFetcher>> {
    if let Some(root) = mirror {
        info!("使用本地镜像: {:?}", root);
        return Ok(Arc::new(MirrorFetcher::new(root, config.dataset.base_url.clone())));
    }

    #[cfg(feature = "http")]
    {
        let fetcher = pokemon_tournament::HttpFetcher::new(&config.dataset)?;
        Ok(Arc::new(fetcher))
    }

    #[cfg(not(feature = "http"))]
    {
        Err(anyhow::anyhow!("未启用 http 特性，请使用 --mirror 指定本地数据目录"))
    }
}

async fn play(ctx: &TournamentContext, category: &CategoryId) -> anyhow::Result<()> {
    let mut state = ctx.start_tournament(category).await;
    let mut outcome = ctx.next_pair(&mut state);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let matchup = match &outcome {
            RoundOutcome::Pair(matchup) => matchup.clone(),
            RoundOutcome::Concluded(ranking) => {
                print_ranking(category, ranking);
                return Ok(());
            }
            RoundOutcome::NoContest => {
                println!("{} 属性没有可参赛的宝可梦", category);
                return Ok(());
            }
            RoundOutcome::NotStarted => {
                anyhow::bail!("锦标赛尚未开始: {}", category);
            }
        };

        println!();
        println!("第{}轮 (剩余 {} 只)", state.rounds() + 1, state.pool().len());
        println!("  [1] {}  {}", matchup.first.name, matchup.first.image_url);
        println!("  [2] {}  {}", matchup.second.name, matchup.second.image_url);
        println!("选择 1 / 2，r 重置，q 退出:");

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        let (winner, loser) = match line.trim() {
            "1" => (&matchup.first, &matchup.second),
            "2" => (&matchup.second, &matchup.first),
            "r" | "R" => {
                outcome = ctx.reset_tournament(&mut state);
                if ctx.config().tournament.reset_clears_scores {
                    println!("已重置，胜场清零");
                } else {
                    println!("已重置，累计胜场保留");
                }
                continue;
            }
            "q" | "Q" => break,
            other => {
                println!("无法识别的输入: {}", other);
                continue;
            }
        };

        outcome = resolve(ctx, &mut state, &winner.name, &loser.name, outcome)?;
    }

    print_ranking(category, &ctx.ranking(category, ctx.config().tournament.top_n));
    Ok(())
}

fn resolve(
    ctx: &TournamentContext,
    state: &mut TournamentState,
    winner: &str,
    loser: &str,
    previous: RoundOutcome,
) -> anyhow::Result<RoundOutcome> {
    match ctx.resolve_choice(state, winner, loser) {
        Ok(outcome) => Ok(outcome),
        Err(e) if e.is_recoverable() => {
            println!("{}", e);
            Ok(previous)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_types() {
    for kind in PokemonType::ALL {
        println!("{:<10} {}", kind.as_str(), kind.chinese_name());
    }
}

fn print_roster(category: &CategoryId, roster: &[CreatureRecord]) {
    println!("{} 属性花名册 ({} 只)", category, roster.len());
    for record in roster {
        let lineage: Vec<&str> = record.lineage.iter().map(|n| n.name.as_str()).collect();
        if lineage.is_empty() {
            println!("  {}", record.name);
        } else {
            println!("  {:<20} {}", record.name, lineage.join(" → "));
        }
    }
}

fn print_ranking(category: &CategoryId, ranking: &[RankedEntry]) {
    println!();
    println!("🏆 {} 属性人气排行", category);
    for entry in ranking {
        println!("  {}. {} ({} 胜)  {}", entry.rank, entry.record.name, entry.wins, entry.record.image_url);
    }
}
