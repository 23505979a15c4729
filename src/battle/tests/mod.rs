mod common;


#[cfg(test)]
mod test_priority;


#[cfg(test)]
mod test_fainting;

#[cfg(test)]
mod test_effects;

#[cfg(test)]
mod test_validator;
