mod clausal_propagator;

pub(crate) use clausal_propagator::ClausalPropagator;
