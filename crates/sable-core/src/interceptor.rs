use std::sync::Arc;

use crate::ids::ClassType;
use crate::input::InputLocation;
use crate::model::Body;

/// A pass applied to every method body while its class is being built.
pub trait BodyInterceptor: Send + Sync {
    fn name(&self) -> &str;

    fn intercept(&self, class_type: &ClassType, method: &str, body: &mut Body);
}

/// Chooses the interceptor pipeline for classes coming from a given input location.
pub type InterceptorSelector =
    Arc<dyn Fn(&dyn InputLocation) -> Vec<Arc<dyn BodyInterceptor>> + Send + Sync>;

/// The identity pipeline: no interceptors for any location.
pub fn no_interceptors() -> InterceptorSelector {
    Arc::new(|_: &dyn InputLocation| Vec::new())
}

/// The same pipeline for every location.
pub fn uniform_interceptors(pipeline: Vec<Arc<dyn BodyInterceptor>>) -> InterceptorSelector {
    Arc::new(move |_: &dyn InputLocation| pipeline.clone())
}
