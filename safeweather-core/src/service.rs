//! Cache-or-fetch-or-fallback front end over a [`WeatherProvider`].
//!
//! No method here fails. Provider errors are logged and replaced by demo
//! payloads tagged with a [`FallbackReason`].

use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    Config,
    cache::{self, CacheKey, CachedPayload, DataKind, WeatherCache},
    demo,
    model::{
        AirQualityReading, AlertRecord, Coordinates, FallbackReason, Fetched, ForecastBundle,
        WeatherReport, WeatherSnapshot,
    },
    provider::{ProviderError, WeatherProvider, provider_from_config},
};

#[derive(Debug)]
pub struct WeatherService {
    provider: Box<dyn WeatherProvider>,
    cache: WeatherCache,
    update_in_progress: AtomicBool,
}

impl WeatherService {
    pub fn new(provider: Box<dyn WeatherProvider>, cache: WeatherCache) -> Self {
        if !provider.is_configured() {
            tracing::warn!(
                "Weather API not configured, serving demo data; run `safeweather configure` to set a WeatherAPI.com key"
            );
        }

        Self {
            provider,
            cache,
            update_in_progress: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        let cache = cache::build_cache(config.cache.ttl(), config.cache.capacity);
        Ok(Self::new(provider, cache))
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    pub async fn get_current_weather(&self, coords: Coordinates) -> Fetched<WeatherSnapshot> {
        let key = CacheKey::new(DataKind::Current, coords);
        if let Some(CachedPayload::Current(snapshot)) = self.cached(&key) {
            tracing::debug!(%coords, "current weather served from cache");
            return Fetched::live(snapshot);
        }

        match self.provider.fetch_current(coords).await {
            Ok(snapshot) => {
                self.store(key, CachedPayload::Current(snapshot.clone()));
                Fetched::live(snapshot)
            }
            Err(e) => Fetched::fallback(demo::current_weather(), fallback_reason("current weather", &e)),
        }
    }

    pub async fn get_weather_forecast(&self, coords: Coordinates) -> Fetched<ForecastBundle> {
        let key = CacheKey::new(DataKind::Forecast, coords);
        if let Some(CachedPayload::Forecast(bundle)) = self.cached(&key) {
            tracing::debug!(%coords, "forecast served from cache");
            return Fetched::live(bundle);
        }

        match self.provider.fetch_forecast(coords).await {
            Ok(bundle) => {
                self.store(key, CachedPayload::Forecast(bundle.clone()));
                Fetched::live(bundle)
            }
            Err(e) => Fetched::fallback(demo::forecast(), fallback_reason("forecast", &e)),
        }
    }

    /// Never cached: every call goes to the provider.
    pub async fn get_weather_alerts(&self, coords: Coordinates) -> Fetched<Vec<AlertRecord>> {
        match self.provider.fetch_alerts(coords).await {
            Ok(alerts) => Fetched::live(alerts),
            Err(e) => Fetched::fallback(demo::alerts(), fallback_reason("alerts", &e)),
        }
    }

    /// Read from the current-weather payload, sharing its cache and fallback.
    pub async fn get_air_quality(&self, coords: Coordinates) -> Fetched<AirQualityReading> {
        let current = self.get_current_weather(coords).await;
        air_quality_of(&current)
    }

    /// Fetches everything for one location concurrently.
    ///
    /// Returns `None` without touching the provider when another update is
    /// still running.
    pub async fn update_weather_for_location(&self, coords: Coordinates) -> Option<WeatherReport> {
        let Some(_guard) = InFlightGuard::acquire(&self.update_in_progress) else {
            tracing::info!(%coords, "weather update already in progress, skipping");
            return None;
        };

        tracing::info!(%coords, "updating weather");

        let (current, forecast, alerts) = tokio::join!(
            self.get_current_weather(coords),
            self.get_weather_forecast(coords),
            self.get_weather_alerts(coords),
        );
        let air_quality = air_quality_of(&current);

        tracing::info!(
            live_current = current.is_live(),
            live_forecast = forecast.is_live(),
            live_alerts = alerts.is_live(),
            "weather update completed"
        );

        Some(WeatherReport {
            current,
            forecast,
            alerts,
            air_quality,
        })
    }

    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }

    fn cached(&self, key: &CacheKey) -> Option<CachedPayload> {
        self.cache.get(key)
    }

    fn store(&self, key: CacheKey, payload: CachedPayload) {
        self.cache.insert(key, payload);
    }
}

fn air_quality_of(current: &Fetched<WeatherSnapshot>) -> Fetched<AirQualityReading> {
    match current {
        Fetched::Live { data } => match &data.air_quality {
            Some(aq) => Fetched::live(aq.clone()),
            None => Fetched::fallback(demo::air_quality(), FallbackReason::MissingAirQuality),
        },
        Fetched::Fallback { reason, .. } => Fetched::fallback(demo::air_quality(), reason.clone()),
    }
}

fn fallback_reason(what: &str, error: &ProviderError) -> FallbackReason {
    match error {
        ProviderError::NotConfigured => tracing::debug!("{what}: provider not configured, using demo data"),
        _ => tracing::warn!(error = %error, "Failed to fetch {what}, using demo data"),
    }
    error.fallback_reason()
}

/// Clears the flag on drop, including when the update future is cancelled.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::{DEFAULT_TTL, build_cache},
        model::{AlertSeverity, AqiTier, Pollutants},
        provider::ProviderResult,
    };
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };
    use tokio::sync::Notify;

    const HERE: Coordinates = Coordinates::new(1.8494, 102.9288);

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Mode {
        Ok,
        Status(u16),
        Unconfigured,
    }

    #[derive(Debug, Default)]
    struct Calls {
        current: AtomicUsize,
        forecast: AtomicUsize,
        alerts: AtomicUsize,
    }

    impl Calls {
        fn total(&self) -> usize {
            self.current.load(Ordering::SeqCst)
                + self.forecast.load(Ordering::SeqCst)
                + self.alerts.load(Ordering::SeqCst)
        }
    }

    #[derive(Debug)]
    struct StubProvider {
        mode: Mode,
        with_air_quality: bool,
        calls: Arc<Calls>,
        gate: Option<Arc<Notify>>,
    }

    impl StubProvider {
        fn new(mode: Mode) -> (Self, Arc<Calls>) {
            let calls = Arc::new(Calls::default());
            let stub = Self {
                mode,
                with_air_quality: true,
                calls: Arc::clone(&calls),
                gate: None,
            };
            (stub, calls)
        }

        async fn respond<T>(&self, counter: &AtomicUsize, value: impl FnOnce() -> T) -> ProviderResult<T> {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match self.mode {
                Mode::Ok => Ok(value()),
                Mode::Status(code) => Err(ProviderError::Status {
                    endpoint: "forecast.json",
                    status: StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    body: String::new(),
                }),
                Mode::Unconfigured => Err(ProviderError::NotConfigured),
            }
        }
    }

    fn live_snapshot(with_air_quality: bool) -> WeatherSnapshot {
        let mut snap = demo::current_weather();
        snap.location_name = "Live Town".to_string();
        snap.air_quality = with_air_quality.then(|| AirQualityReading {
            tier: AqiTier::Moderate,
            pollutants: Pollutants {
                pm2_5: 40.0,
                pm10: 60.0,
                co: 200.0,
                no2: 10.0,
                o3: 40.0,
                so2: 1.0,
            },
        });
        snap
    }

    #[async_trait]
    impl WeatherProvider for StubProvider {
        fn is_configured(&self) -> bool {
            self.mode != Mode::Unconfigured
        }

        async fn fetch_current(&self, _coords: Coordinates) -> ProviderResult<WeatherSnapshot> {
            let with_aq = self.with_air_quality;
            self.respond(&self.calls.current, || live_snapshot(with_aq)).await
        }

        async fn fetch_forecast(&self, _coords: Coordinates) -> ProviderResult<ForecastBundle> {
            self.respond(&self.calls.forecast, || {
                let mut bundle = demo::forecast();
                bundle.location_name = "Live Town".to_string();
                bundle
            })
            .await
        }

        async fn fetch_alerts(&self, _coords: Coordinates) -> ProviderResult<Vec<AlertRecord>> {
            self.respond(&self.calls.alerts, Vec::new).await
        }
    }

    fn service(stub: StubProvider) -> WeatherService {
        WeatherService::new(Box::new(stub), build_cache(DEFAULT_TTL, 16))
    }

    #[tokio::test]
    async fn current_weather_is_cached_within_ttl() {
        let (stub, calls) = StubProvider::new(Mode::Ok);
        let svc = service(stub);

        let first = svc.get_current_weather(HERE).await;
        let second = svc.get_current_weather(HERE).await;

        assert!(first.is_live());
        assert_eq!(first, second);
        assert_eq!(calls.current.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn current_weather_refetches_after_ttl() {
        let (stub, calls) = StubProvider::new(Mode::Ok);
        let ttl = Duration::from_millis(50);
        let svc = WeatherService::new(Box::new(stub), build_cache(ttl, 16));

        svc.get_current_weather(HERE).await;
        svc.get_current_weather(HERE).await;
        assert_eq!(calls.current.load(Ordering::SeqCst), 1);

        tokio::time::sleep(ttl * 3).await;
        svc.get_current_weather(HERE).await;

        assert_eq!(calls.current.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn clear_cache_forces_refetch() {
        let (stub, calls) = StubProvider::new(Mode::Ok);
        let svc = service(stub);

        svc.get_current_weather(HERE).await;
        svc.clear_cache();
        svc.get_current_weather(HERE).await;

        assert_eq!(calls.current.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cache_respects_capacity() {
        let (stub, _calls) = StubProvider::new(Mode::Ok);
        let svc = WeatherService::new(Box::new(stub), build_cache(DEFAULT_TTL, 2));

        for i in 0..10 {
            svc.get_weather_forecast(Coordinates::new(f64::from(i), 100.0)).await;
        }

        svc.cache.run_pending_tasks();
        assert!(svc.cache.entry_count() <= 2);
    }

    #[tokio::test]
    async fn forecast_has_its_own_cache_namespace() {
        let (stub, calls) = StubProvider::new(Mode::Ok);
        let svc = service(stub);

        svc.get_current_weather(HERE).await;
        let forecast = svc.get_weather_forecast(HERE).await;
        svc.get_weather_forecast(HERE).await;

        assert_eq!(forecast.data().location_name, "Live Town");
        assert_eq!(calls.current.load(Ordering::SeqCst), 1);
        assert_eq!(calls.forecast.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn alerts_are_never_cached() {
        let (stub, calls) = StubProvider::new(Mode::Ok);
        let svc = service(stub);

        svc.get_weather_alerts(HERE).await;
        svc.get_weather_alerts(HERE).await;

        assert_eq!(calls.alerts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_resolve_with_tagged_fallbacks() {
        let (stub, calls) = StubProvider::new(Mode::Status(503));
        let svc = service(stub);

        let current = svc.get_current_weather(HERE).await;
        let forecast = svc.get_weather_forecast(HERE).await;
        let alerts = svc.get_weather_alerts(HERE).await;
        let air = svc.get_air_quality(HERE).await;

        assert_eq!(current.reason(), Some(&FallbackReason::Status(503)));
        assert_eq!(forecast.reason(), Some(&FallbackReason::Status(503)));
        assert_eq!(alerts.reason(), Some(&FallbackReason::Status(503)));
        assert_eq!(air.reason(), Some(&FallbackReason::Status(503)));

        assert_eq!(current.data().location_name, "Batu Pahat");
        assert_eq!(forecast.data().daily.len(), 5);
        assert_eq!(alerts.data()[0].severity, AlertSeverity::Critical);
        assert_eq!(air.data().tier, AqiTier::Fair);

        // fallbacks are not cached
        svc.get_current_weather(HERE).await;
        assert_eq!(calls.current.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unconfigured_provider_falls_back() {
        let (stub, _calls) = StubProvider::new(Mode::Unconfigured);
        let svc = service(stub);

        assert!(!svc.is_configured());
        let current = svc.get_current_weather(HERE).await;
        assert_eq!(current.reason(), Some(&FallbackReason::NotConfigured));
    }

    #[tokio::test]
    async fn air_quality_rides_on_current_weather() {
        let (stub, calls) = StubProvider::new(Mode::Ok);
        let svc = service(stub);

        let current = svc.get_current_weather(HERE).await;
        let air = svc.get_air_quality(HERE).await;

        assert!(air.is_live());
        assert_eq!(Some(air.data()), current.data().air_quality.as_ref());
        assert_eq!(calls.current.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_air_quality_block_falls_back() {
        let (mut stub, _calls) = StubProvider::new(Mode::Ok);
        stub.with_air_quality = false;
        let svc = service(stub);

        let air = svc.get_air_quality(HERE).await;
        assert_eq!(air.reason(), Some(&FallbackReason::MissingAirQuality));
    }

    #[tokio::test]
    async fn update_gathers_every_part() {
        let (stub, calls) = StubProvider::new(Mode::Ok);
        let svc = service(stub);

        let report = svc.update_weather_for_location(HERE).await.expect("not in flight");

        assert!(report.current.is_live());
        assert!(report.forecast.is_live());
        assert!(report.alerts.is_live());
        assert!(report.air_quality.is_live());
        assert_eq!(calls.total(), 3);

        // guard released
        assert!(svc.update_weather_for_location(HERE).await.is_some());
    }

    #[tokio::test]
    async fn concurrent_update_is_dropped() {
        let (mut stub, calls) = StubProvider::new(Mode::Ok);
        let gate = Arc::new(Notify::new());
        stub.gate = Some(Arc::clone(&gate));
        let svc = Arc::new(service(stub));

        let first = tokio::spawn({
            let svc = Arc::clone(&svc);
            async move { svc.update_weather_for_location(HERE).await }
        });

        // wait until the first update has reached the provider
        while calls.total() < 3 {
            tokio::task::yield_now().await;
        }

        assert!(svc.update_weather_for_location(HERE).await.is_none());
        assert_eq!(calls.total(), 3);

        for _ in 0..3 {
            gate.notify_one();
        }
        let report = first.await.expect("task joined");
        assert!(report.is_some());
        assert_eq!(calls.total(), 3);
    }

    #[tokio::test]
    async fn cancelled_update_releases_guard() {
        let (mut stub, _calls) = StubProvider::new(Mode::Ok);
        stub.gate = Some(Arc::new(Notify::new()));
        let svc = service(stub);

        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), svc.update_weather_for_location(HERE))
                .await;
        assert!(timed_out.is_err());

        assert!(!svc.update_in_progress.load(Ordering::SeqCst));
    }
}
