use crate::core::{TranslateConfig, DEFAULT_UPSTREAM_TIMEOUT_SECS, DEFAULT_WEIGHT};
use clap::Args;

/// Translation settings, meant to be flattened into a controller's command line:
///
/// ```ignore
/// #[derive(clap::Parser)]
/// struct Cli {
///     #[clap(flatten)]
///     translate: TranslateArgs,
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Args)]
pub struct TranslateArgs {
    /// Weight given to backends and endpoints that do not set one.
    #[clap(
        long,
        default_value_t = DEFAULT_WEIGHT,
        env = "APISIX_INGRESS_DEFAULT_WEIGHT"
    )]
    pub default_weight: u32,

    /// Seconds applied to each upstream timeout that an ApisixUpstream leaves unset.
    #[clap(
        long,
        default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS,
        env = "APISIX_INGRESS_DEFAULT_UPSTREAM_TIMEOUT"
    )]
    pub default_upstream_timeout_secs: u64,

    /// The IngressClass served by this controller. Resources that name no class belong to it.
    #[clap(long, default_value = "apisix", env = "APISIX_INGRESS_CLASS")]
    pub ingress_class: String,

    /// The controller name matched against GatewayClasses and IngressClasses.
    #[clap(
        long,
        default_value = "apisix.apache.org/apisix-ingress-controller",
        env = "APISIX_INGRESS_CONTROLLER_NAME"
    )]
    pub controller_name: String,
}

impl From<TranslateArgs> for TranslateConfig {
    fn from(args: TranslateArgs) -> Self {
        let TranslateArgs {
            default_weight,
            default_upstream_timeout_secs,
            ingress_class,
            controller_name,
        } = args;
        Self {
            default_weight,
            default_upstream_timeout_secs,
            ingress_class,
            controller_name,
        }
    }
}
