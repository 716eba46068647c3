use jobcore::perms::genpolicy::GrantPolicy;
use crate::{
    Enforcer,
    error::Error,
    simple::PolicyEnforcer,
};
#[cfg(feature = "casbin")]
use crate::casbin::{
    CasbinBuilder,
    CasbinEnforcer,
};

#[derive(Clone, Debug, Default)]
pub(crate) enum Kind {
    #[default]
    Policy,
    #[cfg(feature = "casbin")]
    Casbin(CasbinBuilder),
}

/// Builds a grant enforcer for a caller.
///
/// New instances of the builder can be obtained via `Builder::default`
/// or `Builder::new`, both of which produce the `PolicyEnforcer`; a
/// `CasbinBuilder` may be converted into a `Builder` when the `casbin`
/// feature is enabled.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    pub(crate) kind: Kind,
}

impl Builder {
    pub fn new() -> Self {
        Default::default()
    }

    pub async fn build_with_policy(
        &self,
        policy: GrantPolicy,
    ) -> Result<Box<Enforcer>, Error> {
        log::trace!("building a {}Enforcer for {}", self.kind, policy.identity);
        Ok(match &self.kind {
            Kind::Policy => Box::new(PolicyEnforcer::from(policy)),
            #[cfg(feature = "casbin")]
            Kind::Casbin(builder) => Box::new(
                CasbinEnforcer::new(&builder.default_model, policy).await?
            ),
        })
    }
}

mod display {
    use std::fmt::{Display, Formatter, Result};
    use super::Kind;

    impl Display for Kind {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            match self {
                Kind::Policy => f.write_str("Policy"),
                #[cfg(feature = "casbin")]
                Kind::Casbin(..) => f.write_str("Casbin"),
            }
        }
    }
}
