use super::{ParseError, Parsed, Parser};

pub trait Alt<'a, T> {
    fn choice(&self, input: &'a str) -> Parsed<'a, T>;
}

pub trait Sequence<'a, T> {
    fn run(&self, input: &'a str) -> Parsed<'a, T>;
}

macro_rules! alt_tuple {
    ($($parser:ident $index:tt),+) => {
        impl<'a, T, $($parser),+> Alt<'a, T> for ($($parser,)+)
        where
            $($parser: Parser<'a, T>,)+
        {
            fn choice(&self, input: &'a str) -> Parsed<'a, T> {
                let mut children = Vec::new();
                $(
                    let parsed = (self.$index)(input);
                    match parsed.outcome {
                        Ok(value) => return Parsed::success(value, parsed.remaining),
                        Err(error) => children.push(error),
                    }
                )+
                Parsed::failure(ParseError::Alt { children }, input)
            }
        }
    };
}

macro_rules! sequence_tuple {
    ($($parser:ident $output:ident $value:ident $index:tt),+) => {
        impl<'a, $($output, $parser),+> Sequence<'a, ($($output,)+)> for ($($parser,)+)
        where
            $($parser: Parser<'a, $output>,)+
        {
            fn run(&self, input: &'a str) -> Parsed<'a, ($($output,)+)> {
                let rest = input;
                $(
                    let parsed = (self.$index)(rest);
                    let $value = match parsed.outcome {
                        Ok(value) => value,
                        Err(error) => {
                            return Parsed::failure(
                                ParseError::Sequence {
                                    index: $index,
                                    inner: Box::new(error),
                                },
                                input,
                            )
                        }
                    };
                    let rest = parsed.remaining;
                )+
                Parsed::success(($($value,)+), rest)
            }
        }
    };
}

alt_tuple!(A 0, B 1);
alt_tuple!(A 0, B 1, C 2);
alt_tuple!(A 0, B 1, C 2, D 3);
alt_tuple!(A 0, B 1, C 2, D 3, E 4);
alt_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
alt_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);

sequence_tuple!(A TA a 0);
sequence_tuple!(A TA a 0, B TB b 1);
sequence_tuple!(A TA a 0, B TB b 1, C TC c 2);
sequence_tuple!(A TA a 0, B TB b 1, C TC c 2, D TD d 3);
sequence_tuple!(A TA a 0, B TB b 1, C TC c 2, D TD d 3, E TE e 4);
sequence_tuple!(A TA a 0, B TB b 1, C TC c 2, D TD d 3, E TE e 4, F TF f 5);
sequence_tuple!(A TA a 0, B TB b 1, C TC c 2, D TD d 3, E TE e 4, F TF f 5, G TG g 6);
sequence_tuple!(A TA a 0, B TB b 1, C TC c 2, D TD d 3, E TE e 4, F TF f 5, G TG g 6, H TH h 7);
