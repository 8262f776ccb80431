use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};

use dbm_chat_core::bot::bus::EventBus;
use dbm_chat_core::bot::event::Event;
use dbm_chat_core::bot::module::{ChatBot, Module};
use dbm_chat_core::config::PipelineConfig;
use dbm_chat_core::corpus::partitioner::LabelPartitioner;
use dbm_chat_core::io::build_output_path;
use dbm_chat_core::model::char_model::CharNGramModel;
use dbm_chat_core::model::sample_request::{SampleRequest, StartSeed};
use dbm_chat_core::network::builder::{NetworkBuilder, TrainedNetwork};
use dbm_chat_core::text::vocabulary::CharacterVocabulary;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split a transcript CSV into `labels/<label>/data.txt`
    Partition {
        csv: PathBuf,
    },
    /// Train word vectors and the classifier on a transcript CSV
    Train {
        csv: PathBuf,
        /// Where to write the network (default: `<csv>.network`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the most probable label of a text
    Classify {
        #[arg(short, long)]
        model: PathBuf,
        text: String,
    },
    /// Generate text from a character corpus
    Sample(SampleArgs),
    /// Run the chat bot on stdin, one message per line
    Bot {
        #[arg(long, default_value = "console")]
        author: String,
        #[arg(long, default_value = "general")]
        channel: String,
    },
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Corpus file; its model is cached next to it as `.bin`
    #[arg(short, long)]
    corpus: PathBuf,

    /// `random` or `custom:<text>`
    #[arg(short, long, default_value = "random")]
    seed: String,

    #[arg(long, default_value_t = 100)]
    characters: usize,

    #[arg(long, default_value_t = 1)]
    samples: usize,

    /// Overrides `sampling.order` from the configuration
    #[arg(long)]
    order: Option<usize>,

    #[arg(long)]
    rng_seed: Option<u64>,
}

impl Command {
    pub fn run(self, config: PipelineConfig) -> Result<()> {
        match self {
            Command::Partition { csv } => partition(&config, csv),
            Command::Train { csv, output } => train(config, csv, output),
            Command::Classify { model, text } => classify(model, &text),
            Command::Sample(args) => sample(&config, args),
            Command::Bot { author, channel } => bot(author, channel),
        }
    }
}

fn partition(config: &PipelineConfig, csv: PathBuf) -> Result<()> {
    let report = LabelPartitioner::new(&config.partition)
        .partition(&csv)
        .with_context(|| format!("partitioning {}", csv.display()))?;

    for written in &report.written {
        println!("{}\t{} lines\t{}", written.label, written.lines, written.path.display());
    }
    for failed in &report.failed {
        eprintln!("{}\tFAILED\t{}", failed.label, failed.reason);
    }
    Ok(())
}

fn train(config: PipelineConfig, csv: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let output = match output {
        Some(path) => path,
        None => build_output_path(&csv, "network")?,
    };

    let network = NetworkBuilder::new(config)
        .initialize(&csv)
        .with_context(|| format!("training on {}", csv.display()))?;
    network.save(&output)?;

    println!(
        "Network saved to {} ({} inputs, {} outputs, labels: {})",
        output.display(),
        network.input_columns(),
        network.output_size(),
        network.labels().join(", ")
    );
    Ok(())
}

fn classify(model: PathBuf, text: &str) -> Result<()> {
    let network = TrainedNetwork::load(&model).with_context(|| format!("loading {}", model.display()))?;
    let prediction = network.classify(text)?;
    println!("{}\t{:.4}", prediction.label, prediction.probability);
    Ok(())
}

fn sample(config: &PipelineConfig, args: SampleArgs) -> Result<()> {
    let sampling = &config.sampling;
    let order = args.order.unwrap_or(sampling.order);
    if order == 0 {
        bail!("order must be at least 1");
    }

    let vocabulary = CharacterVocabulary::from_name(&sampling.vocabulary)?;
    let mut model = CharNGramModel::load_or_train(&args.corpus, &sampling.encoding, &vocabulary, order)
        .with_context(|| format!("loading corpus {}", args.corpus.display()))?;

    let mut request = SampleRequest::default();
    request.start_seed = StartSeed::parse(&args.seed)?;
    request.rng_seed = args.rng_seed;
    request.set_characters(args.characters)?;
    request.set_samples(args.samples)?;

    for (i, text) in request.run(&mut model, &vocabulary)?.iter().enumerate() {
        println!("----- Sample {} -----", i + 1);
        println!("{text}");
    }
    Ok(())
}

fn bot(author: String, channel: String) -> Result<()> {
    let mut bus = EventBus::new();
    let mut chat_bot = ChatBot::new();
    chat_bot.on_enable(&mut bus);
    bus.dispatch(&Event::Ready);

    for line in io::stdin().lock().lines() {
        let content = line.context("reading stdin")?;
        let event = Event::MessageCreate {
            author: author.clone(),
            channel: channel.clone(),
            content,
        };
        let handled = bus.dispatch(&event);
        log::debug!("Message handled by {handled} listener(s)");
    }

    bus.dispatch(&Event::Disconnect);
    chat_bot.on_disable(&mut bus);
    Ok(())
}
