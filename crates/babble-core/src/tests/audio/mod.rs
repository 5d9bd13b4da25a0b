mod analyser;
