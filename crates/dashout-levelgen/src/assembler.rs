//! Chains generated segments into a [`Level`].
//!
//! The assembler is the single generation entry point. It picks a source per
//! chunk (procedural strategy or predictor plugin), runs the constraint pass
//! over every segment, renumbers objects, and stamps the level with a
//! reproducible id and a readable name.

use rand::RngCore;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use uuid::{Builder, Uuid};

use dashout_core::{
    GenerationMethod, Level, LevelSegment, LevelSource, SeededRng, renumber_objects,
};

use crate::config::{GenerationConfig, LevelGenConfig, Strategy, difficulty_bucket};
use crate::error::{LevelGenError, PredictorError};
use crate::features::FeatureExtractor;
use crate::predictor::{LevelPredictor, Prediction, PredictionContext, segment_from_prediction};
use crate::strategy::{self, TemplateRegistry};
use crate::training::{GenerationContext, TrainingLog};

/// How the assembler sources its segments.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationMode {
    /// The strategy mapped from the config's style.
    Procedural,
    /// Every chunk from the predictor, procedural where it fails.
    Predictor,
    /// Each chunk goes to the predictor with probability `predictor_share`.
    Hybrid { predictor_share: f32 },
    /// One whole strategy per call, drawn from the weights.
    Blend { weights: Vec<(Strategy, f32)> },
}

pub struct LevelAssembler {
    settings: LevelGenConfig,
    templates: TemplateRegistry,
    extractor: FeatureExtractor,
    predictor: Option<Box<dyn LevelPredictor>>,
    training: TrainingLog,
}

impl Default for LevelAssembler {
    fn default() -> Self {
        Self::new(LevelGenConfig::default())
    }
}

impl LevelAssembler {
    pub fn new(settings: LevelGenConfig) -> Self {
        let extractor = FeatureExtractor::new(settings.rhythm_bins);
        Self {
            settings,
            templates: TemplateRegistry::builtin(),
            extractor,
            predictor: None,
            training: TrainingLog::new(),
        }
    }

    pub fn with_predictor(mut self, predictor: Box<dyn LevelPredictor>) -> Self {
        self.set_predictor(Some(predictor));
        self
    }

    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }

    pub fn set_predictor(&mut self, predictor: Option<Box<dyn LevelPredictor>>) {
        if let Some(p) = &predictor {
            let meta = p.metadata();
            tracing::debug!(name = %meta.name, version = %meta.version, "Registered level predictor");
        }
        self.predictor = predictor;
    }

    pub fn has_predictor(&self) -> bool {
        self.predictor.is_some()
    }

    pub fn set_record_training(&mut self, record: bool) {
        self.settings.record_training_examples = record;
    }

    pub fn settings(&self) -> &LevelGenConfig {
        &self.settings
    }

    pub fn training_log(&self) -> &TrainingLog {
        &self.training
    }

    pub fn training_log_mut(&mut self) -> &mut TrainingLog {
        &mut self.training
    }

    pub fn take_training_log(&mut self) -> TrainingLog {
        std::mem::take(&mut self.training)
    }

    /// Generate with the predictor when one is registered, procedurally
    /// otherwise.
    pub fn generate(&mut self, config: &GenerationConfig) -> Result<Level, LevelGenError> {
        let mode = if self.predictor.is_some() {
            GenerationMode::Predictor
        } else {
            GenerationMode::Procedural
        };
        self.generate_with_mode(config, &mode)
    }

    pub fn generate_with_mode(
        &mut self,
        config: &GenerationConfig,
        mode: &GenerationMode,
    ) -> Result<Level, LevelGenError> {
        config.validate()?;
        self.settings.validate()?;
        let mut rng = SeededRng::new(config.seed);

        let segments = match mode {
            GenerationMode::Predictor if self.predictor.is_none() => {
                tracing::debug!("No predictor registered, generating procedurally");
                self.procedural_chunk(config, 0.0, config.length, &mut rng)
            },
            GenerationMode::Procedural => {
                self.procedural_chunk(config, 0.0, config.length, &mut rng)
            },
            GenerationMode::Predictor => self.chunked(config, &mut rng, |_| true),
            GenerationMode::Hybrid { predictor_share } => {
                let share = *predictor_share;
                if !share.is_finite() || !(0.0..=1.0).contains(&share) {
                    return Err(LevelGenError::InvalidConfig(format!(
                        "predictor share must be within [0, 1], got {share}"
                    )));
                }
                self.chunked(config, &mut rng, |rng| rng.chance(share))
            },
            GenerationMode::Blend { weights } => {
                let strategy = pick_blend(weights, &mut rng)?;
                tracing::debug!(strategy = strategy.name(), "Blend selected strategy");
                strategy::generate(strategy, config, &self.templates, &mut rng)
            },
        };

        Ok(self.finish(config, segments))
    }

    /// Predictor-mode generation that awaits the plugin's async path. Each
    /// chunk's prediction resolves before the next chunk is requested.
    pub async fn generate_async(&mut self, config: &GenerationConfig) -> Result<Level, LevelGenError> {
        config.validate()?;
        self.settings.validate()?;
        let mut rng = SeededRng::new(config.seed);
        let Some(predictor) = self.predictor.as_deref() else {
            tracing::debug!("No predictor registered, generating procedurally");
            return self.generate_with_mode(config, &GenerationMode::Procedural);
        };

        let mut segments: Vec<LevelSegment> = Vec::new();
        for (index, (start, len)) in self.chunks(config).into_iter().enumerate() {
            let context = self.prediction_context(config, index, start, len, &segments);
            let result = predictor.predict(&context).await;
            self.push_chunk(config, &context, result, &mut rng, &mut segments);
        }
        Ok(self.finish(config, segments))
    }

    fn chunks(&self, config: &GenerationConfig) -> Vec<(f32, f32)> {
        strategy::chunk_spans(config.length, self.settings.hybrid_chunk_length.max(1.0))
    }

    /// Walk fixed-size chunks, asking `use_predictor` whether each one goes
    /// to the plugin. The draw happens whether or not a predictor is present
    /// so the interleaving pattern depends on the seed alone.
    fn chunked(
        &self,
        config: &GenerationConfig,
        rng: &mut SeededRng,
        mut use_predictor: impl FnMut(&mut SeededRng) -> bool,
    ) -> Vec<LevelSegment> {
        let mut segments: Vec<LevelSegment> = Vec::new();
        for (index, (start, len)) in self.chunks(config).into_iter().enumerate() {
            let wants_predictor = use_predictor(rng);
            match self.predictor.as_deref() {
                Some(predictor) if wants_predictor => {
                    let context = self.prediction_context(config, index, start, len, &segments);
                    let result = predictor.predict_sync(&context);
                    self.push_chunk(config, &context, result, rng, &mut segments);
                },
                _ => segments.extend(self.procedural_chunk(config, start, len, rng)),
            }
        }
        segments
    }

    fn prediction_context(
        &self,
        config: &GenerationConfig,
        segment_index: usize,
        start_x: f32,
        length: f32,
        previous: &[LevelSegment],
    ) -> PredictionContext {
        PredictionContext {
            difficulty: config.difficulty,
            style: config.style,
            seed: config.seed,
            segment_index,
            start_x,
            length,
            previous_features: previous.last().map(|s| self.extractor.features(s)),
        }
    }

    fn push_chunk(
        &self,
        config: &GenerationConfig,
        context: &PredictionContext,
        result: Result<Prediction, PredictorError>,
        rng: &mut SeededRng,
        segments: &mut Vec<LevelSegment>,
    ) {
        match result {
            Ok(prediction) => segments.push(segment_from_prediction(&prediction, context, rng)),
            Err(e) => {
                tracing::warn!(
                    segment = context.segment_index,
                    "Predictor failed: {e}, falling back to procedural"
                );
                segments.extend(self.procedural_chunk(
                    config,
                    context.start_x,
                    context.length,
                    rng,
                ));
            },
        }
    }

    fn procedural_chunk(
        &self,
        config: &GenerationConfig,
        start_x: f32,
        length: f32,
        rng: &mut SeededRng,
    ) -> Vec<LevelSegment> {
        let mut segments = strategy::generate(
            config.style.strategy(),
            &config.with_length(length),
            &self.templates,
            rng,
        );
        for segment in &mut segments {
            segment.translate(start_x);
        }
        segments
    }

    fn finish(&mut self, config: &GenerationConfig, mut segments: Vec<LevelSegment>) -> Level {
        let id = level_id(config);
        let constraints = &self.settings.constraints;
        let mut removed = 0;

        for (index, segment) in segments.iter_mut().enumerate() {
            removed += constraints.filter(segment);
            constraints.validate_difficulty(segment, config.difficulty);
            segment.id = format!("{id}-{index}");
        }
        renumber_objects(&mut segments);

        let model_version = if segments.iter().any(is_ml_segment) {
            self.predictor.as_ref().map(|p| p.version())
        } else {
            None
        };
        let source = if model_version.is_some() {
            LevelSource::Ml
        } else {
            LevelSource::Procedural
        };

        if self.settings.record_training_examples {
            for (index, segment) in segments.iter().enumerate() {
                let context = GenerationContext {
                    difficulty: config.difficulty,
                    style: config.style,
                    seed: config.seed,
                    segment_index: index,
                    start_x: segment.start_x,
                    length: segment.length,
                    method: segment.method(),
                };
                let features = self.extractor.features(segment);
                self.training.record(segment, context, features);
            }
        }

        let total_length = segments.iter().map(|s| s.length).sum();
        let level = Level {
            id,
            name: format!("{} {}", config.style, difficulty_bucket(config.difficulty)),
            segments,
            total_length,
            difficulty: config.difficulty,
            source,
            model_version,
        };
        tracing::debug!(
            level = %level.id,
            name = %level.name,
            segments = level.segments.len(),
            objects = level.object_count(),
            removed,
            "Assembled level"
        );
        level
    }
}

fn is_ml_segment(segment: &LevelSegment) -> bool {
    matches!(
        segment.method(),
        Some(GenerationMethod::Predictor | GenerationMethod::FeatureSynthesis)
    )
}

fn pick_blend(weights: &[(Strategy, f32)], rng: &mut SeededRng) -> Result<Strategy, LevelGenError> {
    if weights.is_empty() {
        return Err(LevelGenError::InvalidBlend("no strategies given".to_string()));
    }
    let dist = WeightedIndex::new(weights.iter().map(|&(_, w)| w))
        .map_err(|e| LevelGenError::InvalidBlend(e.to_string()))?;
    Ok(weights[dist.sample(rng)].0)
}

/// Reproducible id: same config, same id.
fn level_id(config: &GenerationConfig) -> Uuid {
    let salt = config.seed
        ^ (u64::from(config.difficulty.to_bits()) << 32)
        ^ u64::from(config.length.to_bits())
        ^ config.style as u64;
    let mut bytes = [0u8; 16];
    SeededRng::new(salt).fill_bytes(&mut bytes);
    Builder::from_random_bytes(bytes).into_uuid()
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::GenerationStyle;
    use crate::predictor::PredictorMetadata;
    use dashout_core::{GameObject, ObjectId, ObjectKind, SegmentFeatures};

    /// Succeeds on even chunk indices, fails on odd ones.
    struct FlakyPredictor {
        calls: Arc<AtomicUsize>,
        with_obstacles: bool,
    }

    impl LevelPredictor for FlakyPredictor {
        fn load(&mut self, _path: &Path) -> Result<(), PredictorError> {
            Ok(())
        }

        fn version(&self) -> String {
            "flaky-0.1".to_string()
        }

        fn metadata(&self) -> PredictorMetadata {
            PredictorMetadata {
                name: "flaky".to_string(),
                version: self.version(),
                description: None,
                feature_len: None,
            }
        }

        fn predict_sync(&self, context: &PredictionContext) -> Result<Prediction, PredictorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if context.segment_index % 2 == 1 {
                return Err(PredictorError::Unavailable);
            }
            let obstacles = self
                .with_obstacles
                .then(|| vec![GameObject::new(ObjectKind::spike(), 200.0, 520.0, 30.0, 30.0)]);
            Ok(Prediction {
                features: SegmentFeatures {
                    difficulty: context.difficulty,
                    density: 0.4,
                    vertical_complexity: 0.0,
                    gap_frequency: 0,
                    platform_ratio: 1.0,
                    obstacle_types: [0.5, 0.5, 0.0],
                    rhythm_pattern: vec![0; 8],
                },
                obstacles,
                model_version: Some(self.version()),
                confidence: None,
            })
        }
    }

    fn flaky(with_obstacles: bool) -> (Box<dyn LevelPredictor>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let p = FlakyPredictor {
            calls: Arc::clone(&calls),
            with_obstacles,
        };
        (Box::new(p), calls)
    }

    fn cfg(difficulty: f32, length: f32, seed: u64, style: GenerationStyle) -> GenerationConfig {
        GenerationConfig::new(difficulty, length, seed, style)
    }

    #[test]
    fn easiest_classic_level_is_first_steps() {
        let mut assembler = LevelAssembler::default();
        let level = assembler
            .generate(&cfg(0.1, 200.0, 42, GenerationStyle::Classic))
            .unwrap();
        assert_eq!(level.segments.len(), 1);
        let seg = &level.segments[0];
        assert_eq!(seg.metadata.as_ref().unwrap().template_name.as_deref(), Some("first_steps"));
        assert_eq!(seg.objects.len(), 3);
        assert_eq!(level.total_length, 200.0);
        assert_eq!(level.name, "Classic Easy");
        assert_eq!(level.source, LevelSource::Procedural);
    }

    #[test]
    fn same_config_same_level() {
        let config = cfg(0.55, 3000.0, 1234, GenerationStyle::Modern);
        let a = LevelAssembler::default().generate(&config).unwrap();
        let b = LevelAssembler::default().generate(&config).unwrap();
        assert_eq!(a, b);
        let c = LevelAssembler::default()
            .generate(&cfg(0.55, 3000.0, 1235, GenerationStyle::Modern))
            .unwrap();
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn object_ids_count_up_from_one() {
        let level = LevelAssembler::default()
            .generate(&cfg(0.7, 2500.0, 5, GenerationStyle::Extreme))
            .unwrap();
        let ids: Vec<ObjectId> = level.objects().map(|o| o.id).collect();
        let expected: Vec<ObjectId> = (1..=ids.len() as ObjectId).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn segment_difficulty_stays_near_request() {
        for style in [GenerationStyle::Classic, GenerationStyle::Modern, GenerationStyle::Extreme] {
            let level = LevelAssembler::default()
                .generate(&cfg(0.3, 4000.0, 77, style))
                .unwrap();
            for seg in &level.segments {
                assert!((seg.difficulty - 0.3).abs() <= 0.2 + 1e-5);
            }
        }
    }

    #[test]
    fn invalid_settings_are_an_error_not_a_panic() {
        let mut settings = LevelGenConfig::default();
        settings.constraints.max_difficulty_deviation = -0.3;
        let mut assembler = LevelAssembler::new(settings);
        let config = cfg(0.5, 1000.0, 1, GenerationStyle::Modern);
        assert!(matches!(
            assembler.generate(&config),
            Err(LevelGenError::InvalidConfig(_))
        ));
        assert!(matches!(
            futures::executor::block_on(assembler.generate_async(&config)),
            Err(LevelGenError::InvalidConfig(_))
        ));
    }

    #[test]
    fn invalid_config_is_an_error() {
        let mut assembler = LevelAssembler::default();
        assert!(matches!(
            assembler.generate(&cfg(2.0, 1000.0, 1, GenerationStyle::Classic)),
            Err(LevelGenError::InvalidConfig(_))
        ));
        assert!(matches!(
            assembler.generate(&cfg(0.5, -5.0, 1, GenerationStyle::Classic)),
            Err(LevelGenError::InvalidConfig(_))
        ));
        let hybrid = GenerationMode::Hybrid { predictor_share: 1.5 };
        assert!(
            assembler
                .generate_with_mode(&cfg(0.5, 1000.0, 1, GenerationStyle::Classic), &hybrid)
                .is_err()
        );
    }

    #[test]
    fn predictor_mode_without_predictor_is_procedural() {
        let config = cfg(0.4, 1500.0, 9, GenerationStyle::Classic);
        let mut assembler = LevelAssembler::default();
        let level = assembler
            .generate_with_mode(&config, &GenerationMode::Predictor)
            .unwrap();
        assert_eq!(level.source, LevelSource::Procedural);
        assert!(level.model_version.is_none());
        assert!((level.total_length - 1500.0).abs() <= 1.0);
    }

    #[test]
    fn failing_chunks_fall_back_to_procedural() {
        let (predictor, calls) = flaky(true);
        let mut assembler = LevelAssembler::default().with_predictor(predictor);
        let level = assembler
            .generate(&cfg(0.5, 2000.0, 3, GenerationStyle::Modern))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(level.source, LevelSource::Ml);
        assert_eq!(level.model_version.as_deref(), Some("flaky-0.1"));
        let methods: Vec<Option<GenerationMethod>> =
            level.segments.iter().map(|s| s.method()).collect();
        assert_eq!(
            methods,
            vec![
                Some(GenerationMethod::Predictor),
                Some(GenerationMethod::Noise),
                Some(GenerationMethod::Predictor),
                Some(GenerationMethod::Noise),
            ]
        );
        assert_eq!(level.segments[1].start_x, 500.0);
    }

    #[test]
    fn predictions_without_obstacles_are_synthesized() {
        let (predictor, _) = flaky(false);
        let mut assembler = LevelAssembler::default().with_predictor(predictor);
        let level = assembler
            .generate(&cfg(0.5, 500.0, 3, GenerationStyle::Classic))
            .unwrap();
        assert_eq!(level.segments[0].method(), Some(GenerationMethod::FeatureSynthesis));
    }

    #[test]
    fn hybrid_interleaving_is_seed_driven() {
        let mode = GenerationMode::Hybrid { predictor_share: 0.5 };
        let config = cfg(0.5, 6000.0, 2024, GenerationStyle::Extreme);
        let run = || {
            let (predictor, calls) = flaky(true);
            let mut assembler = LevelAssembler::default().with_predictor(predictor);
            let level = assembler.generate_with_mode(&config, &mode).unwrap();
            (level, calls.load(Ordering::SeqCst))
        };
        let (a, calls_a) = run();
        let (b, calls_b) = run();
        assert_eq!(a, b);
        assert_eq!(calls_a, calls_b);
        assert!(calls_a <= 12);
    }

    #[test]
    fn hybrid_share_extremes() {
        let config = cfg(0.5, 2000.0, 8, GenerationStyle::Classic);
        let (predictor, calls) = flaky(true);
        let mut assembler = LevelAssembler::default().with_predictor(predictor);
        assembler
            .generate_with_mode(&config, &GenerationMode::Hybrid { predictor_share: 0.0 })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assembler
            .generate_with_mode(&config, &GenerationMode::Hybrid { predictor_share: 1.0 })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn blend_with_one_weight_uses_that_strategy() {
        let mode = GenerationMode::Blend {
            weights: vec![(Strategy::Wave, 1.0), (Strategy::Noise, 0.0)],
        };
        let level = LevelAssembler::default()
            .generate_with_mode(&cfg(0.5, 1800.0, 6, GenerationStyle::Classic), &mode)
            .unwrap();
        assert!(
            level
                .segments
                .iter()
                .all(|s| s.method() == Some(GenerationMethod::Wave))
        );
    }

    #[test]
    fn blend_rejects_bad_weights() {
        let config = cfg(0.5, 1000.0, 6, GenerationStyle::Classic);
        let mut assembler = LevelAssembler::default();
        for weights in [
            vec![],
            vec![(Strategy::Template, 0.0), (Strategy::Wave, 0.0)],
            vec![(Strategy::Noise, -1.0)],
        ] {
            let result = assembler.generate_with_mode(&config, &GenerationMode::Blend { weights });
            assert!(matches!(result, Err(LevelGenError::InvalidBlend(_))));
        }
    }

    #[test]
    fn async_path_matches_sync_path() {
        let config = cfg(0.5, 2000.0, 3, GenerationStyle::Modern);
        let (p1, _) = flaky(true);
        let (p2, _) = flaky(true);
        let sync = LevelAssembler::default().with_predictor(p1).generate(&config).unwrap();
        let mut async_assembler = LevelAssembler::default().with_predictor(p2);
        let via_async = futures::executor::block_on(async_assembler.generate_async(&config)).unwrap();
        assert_eq!(sync, via_async);
    }

    #[test]
    fn training_log_records_when_enabled() {
        let config = cfg(0.5, 1500.0, 10, GenerationStyle::Classic);
        let mut assembler = LevelAssembler::default();
        assembler.generate(&config).unwrap();
        assert!(assembler.training_log().is_empty());

        assembler.set_record_training(true);
        let level = assembler.generate(&config).unwrap();
        let log = assembler.take_training_log();
        assert_eq!(log.len(), level.segments.len());
        assert_eq!(log.examples()[0].segment_id, level.segments[0].id);
        assert_eq!(log.examples()[0].input.seed, 10);
        assert!(assembler.training_log().is_empty());
    }

    #[test]
    fn level_names_follow_style_and_bucket() {
        let mut assembler = LevelAssembler::default();
        let name = |a: &mut LevelAssembler, d: f32, s: GenerationStyle| {
            a.generate(&cfg(d, 600.0, 1, s)).unwrap().name
        };
        assert_eq!(name(&mut assembler, 0.45, GenerationStyle::Modern), "Modern Hard");
        assert_eq!(name(&mut assembler, 0.9, GenerationStyle::Extreme), "Extreme Extreme");
        assert_eq!(name(&mut assembler, 0.25, GenerationStyle::Classic), "Classic Normal");
    }
}
