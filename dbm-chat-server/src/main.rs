use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware, put, web};
use clap::Parser;
use serde::Deserialize;

use dbm_chat_core::ChatError;
use dbm_chat_core::config::{PipelineConfig, SamplingConfig};
use dbm_chat_core::io::list_files;
use dbm_chat_core::model::char_model::CharNGramModel;
use dbm_chat_core::model::sample_request::{SampleRequest, StartSeed};
use dbm_chat_core::text::vocabulary::CharacterVocabulary;

/// HTTP API serving character sampling from corpora in a data directory.
#[derive(Parser, Debug)]
#[command(name = "dbm-chat-server")]
struct Args {
	/// Address to bind
	#[arg(long, env = "DBM_CHAT_BIND", default_value = "127.0.0.1")]
	bind: String,

	#[arg(long, env = "DBM_CHAT_PORT", default_value_t = 5000)]
	port: u16,

	/// Directory holding `<name>.txt` corpora (and their `.bin` caches)
	#[arg(long, env = "DBM_CHAT_DATA", default_value = "./data")]
	data: PathBuf,

	/// Pipeline configuration; only the `[sampling]` section is used
	#[arg(long, env = "DBM_CHAT_CONFIG")]
	config: Option<PathBuf>,
}

/// Query parameters of `/v1/sample`
#[derive(Deserialize)]
struct SampleParams {
	seed: Option<String>, // "random" or "custom:<text>"
	characters: Option<usize>,
	samples: Option<usize>,
	rng_seed: Option<u64>,
}

#[derive(Deserialize)]
struct ModelQuery {
	names: Option<String>,
}

struct SharedData {
	data_dir: PathBuf,
	sampling: SamplingConfig,
	vocabulary: CharacterVocabulary,
	model: Option<CharNGramModel>,
}

impl SampleParams {
	fn request(&self) -> Result<SampleRequest, ChatError> {
		let mut request = SampleRequest::default();
		request.start_seed = match &self.seed {
			Some(s) => StartSeed::parse(s)?,
			None => StartSeed::Random,
		};
		request.rng_seed = self.rng_seed;
		if let Some(characters) = self.characters {
			request.set_characters(characters)?;
		}
		if let Some(samples) = self.samples {
			request.set_samples(samples)?;
		}
		Ok(request)
	}
}

/// Maps caller mistakes to 400 and everything else to 500.
fn error_response(e: ChatError) -> HttpResponse {
	match e {
		ChatError::InvalidInput(_) | ChatError::UnknownCharacter(_) => HttpResponse::BadRequest().body(e.to_string()),
		_ => {
			log::error!("{e}");
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

/// HTTP GET endpoint `/v1/sample`
///
/// Samples strings from the loaded model; one string per line.
/// The model stays locked for the whole request.
#[get("/v1/sample")]
async fn get_sample(data: web::Data<Mutex<SharedData>>, query: web::Query<SampleParams>) -> impl Responder {
	let request = match query.request() {
		Ok(r) => r,
		Err(e) => return error_response(e),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let SharedData { vocabulary, model, .. } = &mut *shared_data;
	let Some(model) = model.as_mut() else {
		return HttpResponse::Conflict().body("No model loaded");
	};

	match request.run(model, vocabulary) {
		Ok(samples) => HttpResponse::Ok().body(samples.join("\n")),
		Err(e) => error_response(e),
	}
}

#[get("/v1/models")]
async fn get_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let data_dir = match data.lock() {
		Ok(m) => m.data_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match list_files(&data_dir, "txt") {
		Ok(files) => {
			let names: Vec<&str> = files.iter().map(|f| f.trim_end_matches(".txt")).collect();
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(e) => error_response(e),
	}
}

#[get("/v1/loaded_models")]
async fn get_loaded_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let names = shared_data.model.as_ref().map(|m| m.sources().join("\n")).unwrap_or_default();
	HttpResponse::Ok().body(names)
}

/// HTTP PUT endpoint `/v1/load_models?names=a,b`
///
/// Replaces the current model with the merge of the named corpora. The
/// current model is kept when any of them fails to load.
#[put("/v1/load_models")]
async fn put_models(data: web::Data<Mutex<SharedData>>, query: web::Query<ModelQuery>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};

	let model_names: Vec<&str> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.collect();
	if let Some(bad) = model_names.iter().find(|n| n.contains(['/', '\\']) || n.starts_with('.')) {
		return HttpResponse::BadRequest().body(format!("Invalid model name {bad:?}"));
	}

	let mut merged = match CharNGramModel::new(shared_data.vocabulary.clone(), shared_data.sampling.order) {
		Ok(m) => m,
		Err(e) => return error_response(e),
	};
	for name in model_names {
		let corpus = shared_data.data_dir.join(format!("{name}.txt"));
		if !corpus.is_file() {
			return HttpResponse::NotFound().body(format!("Unknown model {name:?}"));
		}
		let partial_model = match CharNGramModel::load_or_train(
			&corpus,
			&shared_data.sampling.encoding,
			&shared_data.vocabulary,
			shared_data.sampling.order,
		) {
			Ok(m) => m,
			Err(e) => return error_response(e),
		};
		if let Err(e) = merged.merge(&partial_model) {
			return error_response(e);
		}
	}

	log::info!("Loaded models: {}", merged.sources().join(", "));
	shared_data.model = Some(merged);
	HttpResponse::Ok().body("Models loaded successfully")
}

fn shared_data(args: &Args) -> Result<SharedData, ChatError> {
	let config = match &args.config {
		Some(path) => PipelineConfig::load(path)?,
		None => PipelineConfig::default(),
	};
	let vocabulary = CharacterVocabulary::from_name(&config.sampling.vocabulary)?;
	Ok(SharedData {
		data_dir: args.data.clone(),
		sampling: config.sampling,
		vocabulary,
		model: None,
	})
}

/// Main entry point for the server.
///
/// Starts with no model loaded; `PUT /v1/load_models` loads one.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let shared_data = shared_data(&args).map_err(std::io::Error::other)?;
	let shared_model = web::Data::new(Mutex::new(shared_data));

	log::info!("Serving {} on {}:{}", args.data.display(), args.bind, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(middleware::Logger::default())
			.wrap(Cors::default().allow_any_origin().allowed_methods(vec!["GET", "PUT"]))
			.app_data(shared_model.clone())
			.service(get_sample)
			.service(get_models)
			.service(put_models)
			.service(get_loaded_models)
	})
		.bind((args.bind.as_str(), args.port))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use actix_web::http::StatusCode;
	use actix_web::test;

	use super::*;

	fn state(data_dir: PathBuf) -> web::Data<Mutex<SharedData>> {
		web::Data::new(Mutex::new(SharedData {
			data_dir,
			sampling: SamplingConfig { order: 3, ..SamplingConfig::default() },
			vocabulary: CharacterVocabulary::minimal(),
			model: None,
		}))
	}

	#[actix_web::test]
	async fn sampling_without_model_is_a_conflict() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(state(dir.path().to_owned())).service(get_sample)).await;

		let req = test::TestRequest::get().uri("/v1/sample").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::CONFLICT);
	}

	#[actix_web::test]
	async fn loaded_corpus_is_listed_and_sampled() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("hello.txt"), "hello\nhello\n").unwrap();
		let app = test::init_service(
			App::new()
				.app_data(state(dir.path().to_owned()))
				.service(get_sample)
				.service(get_models)
				.service(put_models)
				.service(get_loaded_models),
		)
		.await;

		let req = test::TestRequest::get().uri("/v1/models").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "hello");

		let req = test::TestRequest::put().uri("/v1/load_models?names=hello").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

		let req = test::TestRequest::get().uri("/v1/loaded_models").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "hello");

		let req = test::TestRequest::get()
			.uri("/v1/sample?seed=custom:he&characters=3&samples=2&rng_seed=1")
			.to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "hello\nhello");
	}

	#[actix_web::test]
	async fn bad_parameters_are_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(
			App::new()
				.app_data(state(dir.path().to_owned()))
				.service(get_sample)
				.service(put_models),
		)
		.await;

		let req = test::TestRequest::get().uri("/v1/sample?seed=whatever").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put().uri("/v1/load_models?names=../etc").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
	}
}
