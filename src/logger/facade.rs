//! The logger facade.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::Utc;
use tokio::time;
use tracing_subscriber::fmt::MakeWriter;

use crate::alerts::{
    Alert, AlertError, AlertSender, CustomErrorHandler, ErrorContext, HandlerError, MailgunSender,
    TraceFormatter,
};
use crate::config::{validate_config, ConfigError, LoggerConfig, RemoteControlConfig};
use crate::error::LoggerError;
use crate::logger::host::HostAlias;
use crate::logging::{LineFormat, LogSink, Severity, Threshold};
use crate::remote::{
    ChannelState, CommandHandler, CommandTable, Connector, ControlTopic, MqttConnector,
    RemoteChannel, RemoteError,
};

/// A named logger for one service, with optional email alerting and
/// optional remote control.
pub struct AppLogger {
    name: String,
    host: HostAlias,
    sink: LogSink,
    send_alerts: bool,
    alerts: Arc<dyn AlertSender>,
    alert_timeout: Duration,
    error_handler: ArcSwapOption<CustomErrorHandler>,
    commands: Mutex<CommandTable>,
    remote: ArcSwapOption<RemoteChannel>,
}

impl AppLogger {
    /// Create a logger writing to stdout.
    pub async fn new(config: &LoggerConfig, host: HostAlias, alerts: Arc<dyn AlertSender>) -> Self {
        Self::with_writer(config, host, alerts, io::stdout).await
    }

    /// Create a logger writing to `writer`.
    ///
    /// With `is_service` set, the "service started" alert goes out first; a
    /// failed send is logged and construction carries on.
    pub async fn with_writer<W>(
        config: &LoggerConfig,
        host: HostAlias,
        alerts: Arc<dyn AlertSender>,
        writer: W,
    ) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let sink = LogSink::with_writer(
            &config.name,
            Threshold::from_name(&config.level),
            LineFormat::parse(&config.format),
            writer,
        );
        let alert_timeout = Duration::from_secs(config.alerts.timeout_secs.max(1));

        if config.is_service {
            let alert = Alert::service_started(host.as_str(), &config.name, Utc::now());
            deliver(&sink, alerts.as_ref(), alert_timeout, &alert).await;
        }

        Self {
            name: config.name.clone(),
            host,
            sink,
            send_alerts: config.send_alerts,
            alerts,
            alert_timeout,
            error_handler: ArcSwapOption::empty(),
            commands: Mutex::new(CommandTable::new()),
            remote: ArcSwapOption::empty(),
        }
    }

    /// Validate `config`, resolve the host alias, build the mail client and
    /// enable remote control if configured.
    pub async fn from_config(config: LoggerConfig) -> Result<Self, LoggerError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let host = match &config.host_alias {
            Some(alias) => HostAlias::new(alias.clone()),
            None => HostAlias::resolve(),
        };
        let alerts = Arc::new(MailgunSender::new(&config.alerts)?);

        let logger = Self::new(&config, host, alerts).await;
        if let Some(remote) = &config.remote_control {
            logger.enable_remote_control(remote).await?;
        }
        Ok(logger)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &HostAlias {
        &self.host
    }

    /// The underlying sink, for callers that want to log through it directly.
    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    pub fn alerts_enabled(&self) -> bool {
        self.send_alerts
    }

    fn log(&self, severity: Severity, message: impl fmt::Display) {
        self.sink.log(severity, &message.to_string());
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Severity::Debug, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(Severity::Info, message);
    }

    pub fn warning(&self, message: impl fmt::Display) {
        self.log(Severity::Warning, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(Severity::Error, message);
    }

    pub fn critical(&self, message: impl fmt::Display) {
        self.log(Severity::Critical, message);
    }

    /// Log `message` with the trace of `error`, then report it.
    ///
    /// 1. A connected remote channel gets an exception notice (failures ignored).
    /// 2. Without a custom handler and with alerts on, the trace is emailed
    ///    (failures logged).
    /// 3. With a custom handler, the handler runs instead of the email and its
    ///    error, if any, is returned unchanged.
    ///
    /// `message` is converted and the backtrace captured before the future
    /// is created; the future itself only owns the converted `String`.
    pub fn exception<'a>(
        &'a self,
        message: impl Into<String>,
        error: &'a (dyn Error + Send + Sync + 'static),
    ) -> impl Future<Output = Result<(), HandlerError>> + Send + 'a {
        let message: String = message.into();
        let context = ErrorContext::capture(message.clone(), error);

        async move {
            let trace = TraceFormatter;
            self.sink
                .error(&format!("{}\n{}", message, trace.text(&context)));

            if let Some(remote) = self.remote.load_full() {
                if remote.is_connected() {
                    if let Err(e) = remote.publish_exception(&message).await {
                        self.sink
                            .debug(&format!("Failed to publish exception notice: {}", e));
                    }
                }
            }

            match self.error_handler.load_full() {
                None => {
                    if self.send_alerts {
                        let alert = Alert::exception(self.host.as_str(), &self.name, trace.html(&context));
                        deliver(&self.sink, self.alerts.as_ref(), self.alert_timeout, &alert).await;
                    }
                    Ok(())
                }
                Some(handler) => {
                    self.sink
                        .debug(&format!("Executing custom error handler {}", handler.name()));
                    handler.handle(&trace, &context)?;
                    self.sink.debug("Executed custom error handler");
                    Ok(())
                }
            }
        }
    }

    /// Run `work`; on failure report the error through [`exception`] and
    /// return `fallback` instead.
    ///
    /// [`exception`]: AppLogger::exception
    pub async fn protect<T, E, Fut>(&self, fallback: T, work: Fut) -> Result<T, HandlerError>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Error + Send + Sync + 'static,
    {
        match work.await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.exception(e.to_string(), &e).await?;
                Ok(fallback)
            }
        }
    }

    /// Register the handler `exception` runs instead of the default alert.
    ///
    /// `None` is rejected: two error lines are logged, any handler already
    /// registered stays in place, and `false` is returned.
    pub fn set_custom_error_handler(&self, handler: Option<CustomErrorHandler>) -> bool {
        self.sink.debug("Setting custom error handler");
        match handler {
            Some(handler) => {
                self.error_handler.store(Some(Arc::new(handler)));
                self.sink.debug("Custom error handler set");
                true
            }
            None => {
                self.sink.error("NEED A FUNCTION AS AN ARGUMENT");
                self.sink.error("CUSTOM ERROR HANDLER NOT SET");
                false
            }
        }
    }

    /// Name of the registered custom error handler.
    pub fn custom_error_handler(&self) -> Option<String> {
        self.error_handler
            .load_full()
            .map(|handler| handler.name().to_string())
    }

    /// Add a remote command. Takes effect for channels enabled afterwards.
    pub fn register_command(&self, name: &str, handler: CommandHandler) -> Result<(), RemoteError> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .register(name, handler)
    }

    /// Connect to the MQTT broker in `settings` and start accepting commands.
    ///
    /// Returns as soon as the connection attempt is started.
    pub async fn enable_remote_control(&self, settings: &RemoteControlConfig) -> Result<(), RemoteError> {
        self.enable_remote_control_with(settings, &MqttConnector).await
    }

    /// Same as [`enable_remote_control`] with a caller-supplied connector.
    ///
    /// [`enable_remote_control`]: AppLogger::enable_remote_control
    pub async fn enable_remote_control_with(
        &self,
        settings: &RemoteControlConfig,
        connector: &dyn Connector,
    ) -> Result<(), RemoteError> {
        self.sink.info(&format!(
            "Enabling remote control. Server: {}:{} Key: {}",
            settings.server, settings.port, settings.control_key
        ));

        if let Some(previous) = self.remote.swap(None) {
            self.close_channel(&previous).await;
        }

        let topic = ControlTopic::new(self.host.as_str(), &self.name, &settings.control_key);
        self.sink.debug(&format!("Remote control topic: {}", topic));

        let link = connector.connect(topic.as_str(), settings)?;
        let commands = Arc::new(
            self.commands
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        );
        let channel = RemoteChannel::open(topic, link, commands, self.sink.clone());

        if let Some(raced) = self.remote.swap(Some(Arc::new(channel))) {
            self.close_channel(&raced).await;
        }
        Ok(())
    }

    /// Disconnect and drop the remote channel. A no-op without one.
    pub async fn disable_remote_control(&self) -> Result<(), RemoteError> {
        let Some(channel) = self.remote.swap(None) else {
            return Ok(());
        };
        self.sink.info("Disabling remote control");
        channel.close().await
    }

    /// State of the remote channel; `Disconnected` when there is none.
    pub fn remote_state(&self) -> ChannelState {
        self.remote
            .load_full()
            .map_or(ChannelState::Disconnected, |channel| channel.state())
    }

    pub fn remote_channel(&self) -> Option<Arc<RemoteChannel>> {
        self.remote.load_full()
    }

    async fn close_channel(&self, channel: &RemoteChannel) {
        if let Err(e) = channel.close().await {
            self.sink.warning(&format!(
                "Failed to close remote channel {}: {}",
                channel.topic(),
                e
            ));
        }
    }
}

impl fmt::Debug for AppLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppLogger")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("threshold", &self.sink.threshold())
            .field("send_alerts", &self.send_alerts)
            .field("remote_state", &self.remote_state())
            .finish()
    }
}

/// Send one alert, bounded by `timeout`. Failures are logged to `sink`.
async fn deliver(sink: &LogSink, alerts: &dyn AlertSender, timeout: Duration, alert: &Alert) {
    let result = match time::timeout(timeout, alerts.send(alert)).await {
        Ok(result) => result,
        Err(_) => Err(AlertError::Timeout(timeout.as_secs())),
    };

    match result {
        Ok(receipt) => sink.debug(&format!(
            "Alert '{}' sent{}",
            alert.subject,
            receipt.id.map(|id| format!(" ({})", id)).unwrap_or_default()
        )),
        Err(e) => sink.error(&format!("Error in sending email. Exception : {}", e)),
    }
}
